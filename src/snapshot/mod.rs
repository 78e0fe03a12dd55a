//! Stored record streams
//!
//! Snapshots are JSON Lines files, one record per line, in the order they
//! were written. This module loads them for reconciliation and provides the
//! offline utilities that operate on them (dedupe, filter, batch extraction).

mod batches;
mod dedupe;
mod filter;
mod jsonl;

pub use batches::{select_batches, BATCH_SIZE};
pub use dedupe::{dedupe, DedupeReport, REPORTED_DUPLICATES};
pub use filter::{filter_food, FilterReport};
pub use jsonl::{parse_jsonl, read_jsonl, JsonlDocument, JsonlRecord};

use crate::record::{EnrichedRecord, RecordId};
use crate::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// A prior run's records, keyed by id
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Vec<EnrichedRecord>,
    index: HashMap<RecordId, usize>,
}

impl Snapshot {
    /// Loads a snapshot file; malformed lines are skipped
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = read_jsonl(path)?;
        Ok(Self::from_records(
            document
                .records
                .into_iter()
                .map(|record| EnrichedRecord::from_fields(record.value))
                .collect(),
        ))
    }

    /// Indexes records by id; the first record wins for a repeated id
    pub fn from_records(records: Vec<EnrichedRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if let Some(id) = record.id() {
                index.entry(id).or_insert(position);
            }
        }
        Self { records, index }
    }

    pub fn get(&self, id: &RecordId) -> Option<&EnrichedRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    /// Records in file order
    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
