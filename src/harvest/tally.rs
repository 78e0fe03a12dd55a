use crate::output::RunStats;
use crate::record::{Delta, EnrichedRecord};
use std::time::Duration;

/// Bookkeeping class of one final record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyClass {
    Added,
    Updated,
    Unchanged,
    Error,
}

/// Classifies a record from the run mode alone
///
/// Without a delta (full harvest) every record counts as added.
pub fn tally_class(record: &EnrichedRecord, delta: Option<Delta>) -> TallyClass {
    if record.id().is_none() {
        return TallyClass::Error;
    }
    match delta {
        None | Some(Delta::New) => TallyClass::Added,
        Some(Delta::Changed) => TallyClass::Updated,
        Some(Delta::Unchanged) => TallyClass::Unchanged,
    }
}

/// Counts every final record into `stats`, pausing `delay` per record
pub async fn tally(records: &[(EnrichedRecord, Option<Delta>)], delay: Duration, stats: &mut RunStats) {
    for (record, delta) in records {
        stats.record(tally_class(record, *delta));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
