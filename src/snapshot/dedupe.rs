use crate::snapshot::JsonlRecord;
use std::collections::HashSet;

/// Number of duplicate names kept for reporting
pub const REPORTED_DUPLICATES: usize = 10;

/// Result of name-based de-duplication
#[derive(Debug, Default)]
pub struct DedupeReport {
    pub kept: Vec<JsonlRecord>,
    pub removed: usize,
    /// The first duplicates in stream order, as (line, name)
    pub first_duplicates: Vec<(usize, String)>,
}

/// Keeps the first record per lower-cased, trimmed `name`
///
/// Records with an empty or missing name count as duplicates and are dropped.
pub fn dedupe(records: Vec<JsonlRecord>) -> DedupeReport {
    let mut seen: HashSet<String> = HashSet::new();
    let mut report = DedupeReport::default();

    for record in records {
        let name = record.name().unwrap_or_default().trim().to_string();
        let key = name.to_lowercase();

        if key.is_empty() || !seen.insert(key) {
            report.removed += 1;
            if report.first_duplicates.len() < REPORTED_DUPLICATES {
                report.first_duplicates.push((record.line, name));
            }
            continue;
        }

        report.kept.push(record);
    }

    report
}
