use crate::snapshot::JsonlRecord;

const REPORTED_REMOVALS: usize = 10;

/// Result of the non-food filter
#[derive(Debug, Default)]
pub struct FilterReport {
    pub kept: Vec<JsonlRecord>,
    pub removed: usize,
    /// Records dropped because they have no name
    pub skipped: usize,
    /// The first removals in stream order, as (line, name)
    pub first_removed: Vec<(usize, String)>,
}

/// Keeps records whose upper-cased name contains none of `keywords`
pub fn filter_food(records: Vec<JsonlRecord>, keywords: &[String]) -> FilterReport {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|keyword| keyword.trim().to_uppercase())
        .filter(|keyword| !keyword.is_empty())
        .collect();
    let mut report = FilterReport::default();

    for record in records {
        let Some(name) = record.name().map(str::to_uppercase) else {
            report.skipped += 1;
            continue;
        };

        if keywords.iter().any(|keyword| name.contains(keyword.as_str())) {
            report.removed += 1;
            if report.first_removed.len() < REPORTED_REMOVALS {
                report.first_removed.push((record.line, name));
            }
        } else {
            report.kept.push(record);
        }
    }

    report
}
