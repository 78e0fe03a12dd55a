use crate::config::{DepartmentEntry, PaginationConfig, SourceConfig};
use crate::harvest::walker::{listing_items, PageStrategy, Slice};
use crate::harvest::Fetcher;
use crate::ConfigError;
use async_trait::async_trait;

/// Position of a department-scoped walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentCursor {
    pub page: u32,
    /// Index into the targeted departments
    pub position: usize,
    /// Whether any department returned items at this page index so far
    pub page_had_items: bool,
}

/// Selects the departments a run targets
///
/// With no batch every department is in scope. Batches are 1-based chunks of
/// `batch_size` departments in configured order.
pub fn department_scope(
    departments: &[DepartmentEntry],
    batch_size: usize,
    batch: Option<usize>,
) -> Result<Vec<DepartmentEntry>, ConfigError> {
    if departments.is_empty() {
        return Err(ConfigError::Validation(
            "department strategy requires at least one department".to_string(),
        ));
    }

    let Some(batch) = batch else {
        return Ok(departments.to_vec());
    };

    if batch_size == 0 {
        return Err(ConfigError::Validation(
            "department-batch-size must be greater than 0".to_string(),
        ));
    }

    let batches = departments.len().div_ceil(batch_size);
    if batch == 0 || batch > batches {
        return Err(ConfigError::Validation(format!(
            "batch {} out of range (1..={} for {} departments in batches of {})",
            batch,
            batches,
            departments.len(),
            batch_size
        )));
    }

    Ok(departments
        .chunks(batch_size)
        .nth(batch - 1)
        .map(<[DepartmentEntry]>::to_vec)
        .unwrap_or_default())
}

/// Page-counter pagination fanned out over departments
///
/// Every targeted department is fetched at one page index before the index
/// advances. The walk ends when a full page index yields no items from any
/// department, or at the page ceiling.
#[derive(Debug, Clone)]
pub struct DepartmentStrategy {
    path: String,
    per_page: u32,
    include: Option<String>,
    departments: Vec<DepartmentEntry>,
    max_pages: u32,
}

impl DepartmentStrategy {
    pub fn new(
        path: impl Into<String>,
        per_page: u32,
        include: Option<String>,
        departments: Vec<DepartmentEntry>,
        max_pages: u32,
    ) -> Self {
        Self {
            path: path.into(),
            per_page,
            include,
            departments,
            max_pages,
        }
    }

    pub fn from_config(
        source: &SourceConfig,
        pagination: &PaginationConfig,
        departments: Vec<DepartmentEntry>,
    ) -> Self {
        Self::new(
            source.list_path.clone(),
            source.per_page,
            source.include_list.clone(),
            departments,
            pagination.max_pages,
        )
    }

    pub fn departments(&self) -> &[DepartmentEntry] {
        &self.departments
    }

    /// Cursor following a request at `cursor` that yielded `had_items`
    pub fn next_cursor(&self, cursor: &DepartmentCursor, had_items: bool) -> Option<DepartmentCursor> {
        let page_had_items = cursor.page_had_items || had_items;

        if cursor.position + 1 < self.departments.len() {
            return Some(DepartmentCursor {
                page: cursor.page,
                position: cursor.position + 1,
                page_had_items,
            });
        }

        if !page_had_items {
            tracing::debug!("No department returned items at page {}", cursor.page);
            return None;
        }
        if cursor.page >= self.max_pages {
            tracing::info!("Page ceiling of {} reached", self.max_pages);
            return None;
        }

        Some(DepartmentCursor {
            page: cursor.page + 1,
            position: 0,
            page_had_items: false,
        })
    }
}

#[async_trait]
impl PageStrategy for DepartmentStrategy {
    type Cursor = DepartmentCursor;

    fn name(&self) -> &'static str {
        "department"
    }

    fn start(&self) -> DepartmentCursor {
        DepartmentCursor {
            page: 1,
            position: 0,
            page_had_items: false,
        }
    }

    async fn advance(
        &self,
        fetcher: &Fetcher,
        cursor: &DepartmentCursor,
    ) -> (Slice, Option<DepartmentCursor>) {
        let Some(department) = self.departments.get(cursor.position) else {
            return (Slice::ok(format!("page {}", cursor.page), Vec::new()), None);
        };

        let label = format!(
            "{} page {} department {} ({})",
            self.path, cursor.page, department.id, department.name
        );

        let mut query = vec![
            ("per_page", self.per_page.to_string()),
            ("page", cursor.page.to_string()),
            ("department", department.id.to_string()),
        ];
        if let Some(include) = &self.include {
            query.push(("include", include.clone()));
        }

        let slice = match fetcher.fetch(&self.path, &query).await {
            Ok(body) => match listing_items(&body, &label) {
                Ok(items) => Slice::ok(label, items),
                Err(e) => Slice::failed(label, e),
            },
            Err(e) => Slice::failed(label, e),
        };

        let next = self.next_cursor(cursor, !slice.items.is_empty());
        (slice, next)
    }
}
