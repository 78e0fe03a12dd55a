use crate::harvest::{DetailEndpoint, Fetcher};
use crate::output::RunStats;
use crate::record::{prices_differ, Delta, EnrichedRecord, ReconciliationOutcome};
use crate::snapshot::Snapshot;
use std::time::Duration;

/// Classifies a fresh record against its stored counterpart
///
/// No counterpart makes it `New`. A different price list makes it `Changed`,
/// carrying the stored record overlaid by the fresh one. Otherwise the stored
/// record is kept as `Unchanged`.
pub fn classify(prior: Option<&EnrichedRecord>, fresh: EnrichedRecord) -> ReconciliationOutcome {
    match prior {
        None => ReconciliationOutcome::new(Delta::New, fresh),
        Some(prior) => {
            if prices_differ(&prior.prices(), &fresh.prices()) {
                ReconciliationOutcome::new(Delta::Changed, prior.overlaid_by(&fresh))
            } else {
                ReconciliationOutcome::new(Delta::Unchanged, prior.clone())
            }
        }
    }
}

/// Compares fresh records against a prior snapshot
pub struct Reconciler {
    detail: DetailEndpoint,
    delay: Duration,
}

impl Reconciler {
    pub fn new(detail: DetailEndpoint, delay: Duration) -> Self {
        Self { detail, delay }
    }

    /// Reconciles every fresh record, in order
    ///
    /// Records with a stored counterpart get one more detail request for
    /// their current prices; if it fails the stored record is kept unchanged.
    pub async fn reconcile(
        &self,
        fetcher: &Fetcher,
        snapshot: &Snapshot,
        fresh: Vec<EnrichedRecord>,
        stats: &mut RunStats,
    ) -> Vec<ReconciliationOutcome> {
        let mut outcomes = Vec::with_capacity(fresh.len());
        let mut requests = 0usize;

        for record in fresh {
            let prior = record.id().and_then(|id| snapshot.get(&id).map(|p| (id, p)));

            let outcome = match prior {
                None => classify(None, record),
                Some((id, prior)) => {
                    if requests > 0 && !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    requests += 1;

                    match self.detail.fetch(fetcher, &id).await {
                        Ok(detail) => {
                            let current = record.overlaid_by(&EnrichedRecord::from_fields(detail));
                            classify(Some(prior), current)
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Price check for {} failed, keeping stored record: {}",
                                id,
                                e
                            );
                            stats.errors += 1;
                            ReconciliationOutcome::new(Delta::Unchanged, prior.clone())
                        }
                    }
                }
            };

            if outcome.delta == Delta::Changed {
                stats.changed += 1;
            }
            outcomes.push(outcome);
        }

        tracing::info!(
            "Reconciled {} records ({} price checks, {} changed)",
            outcomes.len(),
            requests,
            stats.changed
        );

        outcomes
    }
}
