use crate::config::SourceConfig;
use crate::harvest::walker::{listing_items, PageStrategy, Slice};
use crate::harvest::Fetcher;
use async_trait::async_trait;
use serde_json::Value;

/// Position of a link-based walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCursor {
    pub page: u64,
    /// `links.next` of the previous response; recorded, never followed
    pub next_link: Option<String>,
}

/// Pagination hints read from a listing response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub next_link: Option<String>,
    pub total_pages: Option<u64>,
    pub per_page: Option<u64>,
}

impl PageInfo {
    pub fn from_body(body: &Value) -> Self {
        let next_link = body
            .pointer("/links/next")
            .and_then(Value::as_str)
            .filter(|link| !link.is_empty())
            .map(str::to_string);

        let total_pages = ["/meta/total_pages", "/meta/last_page", "/meta/pagination/last_page"]
            .iter()
            .find_map(|pointer| body.pointer(pointer).and_then(as_count));

        let per_page = body.pointer("/meta/per_page").and_then(as_count);

        Self {
            next_link,
            total_pages,
            per_page,
        }
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Page-counter pagination with server-supplied stop hints
#[derive(Debug, Clone)]
pub struct LinkStrategy {
    path: String,
    per_page: u32,
    include: Option<String>,
}

impl LinkStrategy {
    pub fn new(path: impl Into<String>, per_page: u32, include: Option<String>) -> Self {
        Self {
            path: path.into(),
            per_page,
            include,
        }
    }

    pub fn from_config(source: &SourceConfig) -> Self {
        Self::new(
            source.list_path.clone(),
            source.per_page,
            source.include_list.clone(),
        )
    }

    /// Decides where the walk goes after a successful page
    ///
    /// Stops on an empty batch, when the page reaches the declared page count,
    /// or when there is no next link and the batch was short. The page size is
    /// the one the server reports, falling back to the requested one.
    pub fn next_cursor(
        &self,
        cursor: &LinkCursor,
        info: PageInfo,
        batch_len: usize,
    ) -> Option<LinkCursor> {
        if batch_len == 0 {
            return None;
        }
        if let Some(total) = info.total_pages {
            if cursor.page >= total {
                return None;
            }
        }

        let page_size = info.per_page.unwrap_or(u64::from(self.per_page));
        if info.next_link.is_none() && (batch_len as u64) < page_size {
            return None;
        }

        Some(LinkCursor {
            page: cursor.page + 1,
            next_link: info.next_link,
        })
    }

    fn query(&self, page: u64) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(include) = &self.include {
            query.push(("include", include.clone()));
        }
        query
    }
}

#[async_trait]
impl PageStrategy for LinkStrategy {
    type Cursor = LinkCursor;

    fn name(&self) -> &'static str {
        "link"
    }

    fn start(&self) -> LinkCursor {
        LinkCursor {
            page: 1,
            next_link: None,
        }
    }

    async fn advance(&self, fetcher: &Fetcher, cursor: &LinkCursor) -> (Slice, Option<LinkCursor>) {
        let label = format!("{} page {}", self.path, cursor.page);

        let body = match fetcher.fetch(&self.path, &self.query(cursor.page)).await {
            Ok(body) => body,
            Err(e) => return (Slice::failed(label, e), None),
        };

        let items = match listing_items(&body, &label) {
            Ok(items) => items,
            Err(e) => return (Slice::failed(label, e), None),
        };

        let next = self.next_cursor(cursor, PageInfo::from_body(&body), items.len());
        (Slice::ok(label, items), next)
    }
}
