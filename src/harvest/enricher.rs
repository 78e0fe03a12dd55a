use crate::category::CategoryResolver;
use crate::config::SourceConfig;
use crate::harvest::Fetcher;
use crate::output::RunStats;
use crate::record::{CatalogItem, EnrichedRecord, JsonObject, RecordId};
use crate::{ParseError, SliceError};
use serde_json::Value;
use std::time::Duration;

/// The per-item detail endpoint
#[derive(Debug, Clone)]
pub struct DetailEndpoint {
    path: String,
    include: Option<String>,
}

impl DetailEndpoint {
    pub fn new(path: impl Into<String>, include: Option<String>) -> Self {
        Self {
            path: path.into(),
            include,
        }
    }

    pub fn from_config(source: &SourceConfig) -> Self {
        Self::new(source.detail_path.clone(), source.include_detail.clone())
    }

    /// Path of the detail resource for `id`
    pub fn path_for(&self, id: &RecordId) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), id)
    }

    /// Fetches the detail record for `id`
    ///
    /// The object is unwrapped from `data` when present; any other shape is
    /// an unusable body.
    pub async fn fetch(&self, fetcher: &Fetcher, id: &RecordId) -> Result<JsonObject, SliceError> {
        let path = self.path_for(id);
        let query: Vec<(&str, String)> = self
            .include
            .iter()
            .map(|include| ("include", include.clone()))
            .collect();

        let body = fetcher.fetch(&path, &query).await?;
        Ok(detail_object(body, &path)?)
    }
}

fn detail_object(body: Value, context: &str) -> Result<JsonObject, ParseError> {
    let inner = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    };

    match inner {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::Body {
            context: context.to_string(),
            message: format!("expected an object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Completes listing items with their detail records
pub struct Enricher {
    detail: DetailEndpoint,
    delay: Duration,
    resolver: Option<CategoryResolver>,
    cap: Option<usize>,
}

impl Enricher {
    pub fn new(detail: DetailEndpoint, delay: Duration) -> Self {
        Self {
            detail,
            delay,
            resolver: None,
            cap: None,
        }
    }

    /// Derives a `category` field for every record with a department
    pub fn with_resolver(mut self, resolver: Option<CategoryResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_cap(mut self, cap: Option<usize>) -> Self {
        self.cap = cap;
        self
    }

    /// Enriches items in order, one detail request each
    ///
    /// Items without an id are dropped. A failed or unusable detail response
    /// keeps the listing fields. Both count as errors.
    pub async fn enrich(
        &self,
        fetcher: &Fetcher,
        items: Vec<CatalogItem>,
        stats: &mut RunStats,
    ) -> Vec<EnrichedRecord> {
        let total = items.len();
        let mut records = Vec::with_capacity(total);
        let mut requests = 0usize;

        for (index, item) in items.into_iter().enumerate() {
            if let Some(cap) = self.cap {
                if records.len() >= cap {
                    tracing::info!("Item cap of {} reached during enrichment", cap);
                    break;
                }
            }

            let Some(id) = item.id() else {
                tracing::warn!("Dropping listing item {} without an id", index + 1);
                stats.errors += 1;
                continue;
            };

            if requests > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            requests += 1;

            let record = match self.detail.fetch(fetcher, &id).await {
                Ok(detail) => EnrichedRecord::merge(item, detail),
                Err(e) => {
                    tracing::warn!("Detail for {} unavailable, keeping listing fields: {}", id, e);
                    stats.errors += 1;
                    EnrichedRecord::listing_only(item)
                }
            };

            records.push(self.classify(record));

            if requests % 100 == 0 {
                tracing::info!("Enriched {}/{} items", requests, total);
            }
        }

        records
    }

    fn classify(&self, record: EnrichedRecord) -> EnrichedRecord {
        let Some(resolver) = &self.resolver else {
            return record;
        };
        match resolver.resolve_record(record.fields()) {
            Some(category) => {
                let mut fields = record.fields().clone();
                fields.insert("category".to_string(), Value::String(category));
                EnrichedRecord::from_fields(fields)
            }
            None => record,
        }
    }
}
