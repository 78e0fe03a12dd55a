use crate::snapshot::JsonlRecord;
use crate::ConfigError;
use serde_json::Value;

/// Records per extraction batch
pub const BATCH_SIZE: usize = 100;

/// Selects batches `from..=to` of a record stream
///
/// Batch N holds records `[(N-1)*size, N*size)`; without `to` the selection
/// runs to the end of the stream. With `renumber`, selected records get
/// sequential ids starting at 1.
pub fn select_batches(
    records: Vec<JsonlRecord>,
    from: usize,
    to: Option<usize>,
    size: usize,
    renumber: bool,
) -> Result<Vec<JsonlRecord>, ConfigError> {
    if from == 0 || size == 0 {
        return Err(ConfigError::Validation(
            "batches are numbered from 1 and must hold at least one record".to_string(),
        ));
    }
    if let Some(to) = to {
        if to < from {
            return Err(ConfigError::Validation(format!(
                "to-batch {} comes before from-batch {}",
                to, from
            )));
        }
    }

    let start = (from - 1).saturating_mul(size);
    let end = to.map_or(usize::MAX, |to| to.saturating_mul(size));

    let mut selected: Vec<JsonlRecord> = records
        .into_iter()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect();

    if renumber {
        for (index, record) in selected.iter_mut().enumerate() {
            record
                .value
                .insert("id".to_string(), Value::from(index as u64 + 1));
        }
    }

    Ok(selected)
}
