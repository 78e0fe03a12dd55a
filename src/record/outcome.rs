//! Reconciliation results for records compared against a snapshot
use crate::record::EnrichedRecord;
use std::fmt;

/// How a fresh record relates to the stored snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delta {
    /// Present in the snapshot with identical price entries
    Unchanged,
    /// Present in the snapshot with a different price list
    Changed,
    /// No counterpart in the snapshot
    New,
}

impl Delta {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
            Self::New => "new",
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified record
///
/// For `Changed` the record is the stored record overlaid by the fresh one;
/// for `Unchanged` it is the stored record; for `New` it is the fresh record.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationOutcome {
    pub delta: Delta,
    pub record: EnrichedRecord,
}

impl ReconciliationOutcome {
    pub fn new(delta: Delta, record: EnrichedRecord) -> Self {
        Self { delta, record }
    }

    pub fn is_unchanged(&self) -> bool {
        self.delta == Delta::Unchanged
    }
}
