//! Catalog record types
//!
//! Listing items and detail records are opaque JSON objects; the harvester
//! only ever inspects `id`, `name`, `department` and `prices`.

mod outcome;
mod prices;

pub use outcome::{Delta, ReconciliationOutcome};
pub use prices::{prices_differ, PriceEntry};

use serde_json::{Map, Value};
use std::fmt;

/// A JSON object as returned by the source API
pub type JsonObject = Map<String, Value>;

/// Normalized record identifier
///
/// The source API emits numeric ids, but snapshots written by older tools
/// sometimes carry them as strings; both normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Extracts the id from a JSON value. `null`, empty strings and
    /// non-scalar values have no id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn id_of(fields: &JsonObject) -> Option<RecordId> {
    fields.get("id").and_then(RecordId::from_value)
}

/// Summary record produced by the listing endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    fields: JsonObject,
}

impl CatalogItem {
    /// Wraps a listing entry; non-object entries are not catalog items
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn from_fields(fields: JsonObject) -> Self {
        Self { fields }
    }

    pub fn id(&self) -> Option<RecordId> {
        id_of(&self.fields)
    }

    pub fn fields(&self) -> &JsonObject {
        &self.fields
    }

    pub fn into_fields(self) -> JsonObject {
        self.fields
    }
}

/// A listing item completed with its detail record
///
/// Built once by the enricher (or read back from a snapshot) and never
/// mutated afterwards; every change produces a new record.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    fields: JsonObject,
}

impl EnrichedRecord {
    /// Merges a detail record into a listing item. Detail fields shadow
    /// listing fields on key collision.
    pub fn merge(item: CatalogItem, detail: JsonObject) -> Self {
        let mut fields = item.into_fields();
        fields.extend(detail);
        Self { fields }
    }

    /// Keeps the listing fields as-is (enrichment failed or was skipped)
    pub fn listing_only(item: CatalogItem) -> Self {
        Self {
            fields: item.into_fields(),
        }
    }

    pub fn from_fields(fields: JsonObject) -> Self {
        Self { fields }
    }

    /// Returns `self` overlaid by every field of `newer`; `newer` wins on
    /// every overlapping key.
    pub fn overlaid_by(&self, newer: &EnrichedRecord) -> EnrichedRecord {
        let mut fields = self.fields.clone();
        for (key, value) in &newer.fields {
            fields.insert(key.clone(), value.clone());
        }
        Self { fields }
    }

    pub fn id(&self) -> Option<RecordId> {
        id_of(&self.fields)
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &JsonObject {
        &self.fields
    }

    /// The price-bearing sub-entries, in list order
    pub fn prices(&self) -> Vec<PriceEntry> {
        match self.fields.get("prices") {
            Some(Value::Array(entries)) => entries.iter().map(PriceEntry::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Serializes the record as one JSON Lines line (without the newline)
    pub fn to_line(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_record_id_normalization() {
        assert_eq!(
            RecordId::from_value(&json!(304020)),
            RecordId::from_value(&json!("304020"))
        );
        assert_eq!(RecordId::from_value(&json!(null)), None);
        assert_eq!(RecordId::from_value(&json!("  ")), None);
        assert_eq!(RecordId::from_value(&json!({"id": 1})), None);
    }

    #[test]
    fn test_catalog_item_rejects_non_objects() {
        assert!(CatalogItem::from_value(json!([1, 2])).is_none());
        assert!(CatalogItem::from_value(json!("x")).is_none());
        assert!(CatalogItem::from_value(json!({"id": 1})).is_some());
    }

    #[test]
    fn test_merge_detail_shadows_listing() {
        let item = CatalogItem::from_fields(object(json!({
            "id": 1,
            "name": "MÆLK",
            "underline": "1 L"
        })));
        let detail = object(json!({"id": 1, "name": "ØKO MÆLK", "declaration": "mælk"}));

        let record = EnrichedRecord::merge(item, detail);

        assert_eq!(record.name(), Some("ØKO MÆLK"));
        assert_eq!(record.get("underline"), Some(&json!("1 L")));
        assert_eq!(record.get("declaration"), Some(&json!("mælk")));
    }

    #[test]
    fn test_overlay_newer_wins() {
        let prior = EnrichedRecord::from_fields(object(json!({
            "id": 7,
            "name": "OST",
            "labels": ["øko"],
            "prices": [{"price": 10.0}]
        })));
        let fresh = EnrichedRecord::from_fields(object(json!({
            "id": 7,
            "prices": [{"price": 12.0}]
        })));

        let merged = prior.overlaid_by(&fresh);

        assert_eq!(merged.get("labels"), Some(&json!(["øko"])));
        assert_eq!(merged.get("prices"), Some(&json!([{"price": 12.0}])));
        assert_eq!(merged.name(), Some("OST"));
    }

    #[test]
    fn test_to_line_keeps_utf8() {
        let record = EnrichedRecord::from_fields(object(json!({"name": "RØDBEDER"})));
        assert_eq!(record.to_line(), r#"{"name":"RØDBEDER"}"#);
    }
}
