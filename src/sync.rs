// 🔄 Sync Engine - One reconciliation path for timer and manual triggers
//
// Every sync cycle is: fetch the remote batch, merge it into the loaded
// collection, persist, record a history row. The interval timer, the
// "sync now" action, and CSV import all route through the same tail, so
// precedence rules cannot drift between entry points.

use crate::quote::Quote;
use crate::reconcile::{MergeEngine, MergeReport};
use crate::remote::RemoteSource;
use crate::store::{QuoteStore, SyncRecord, SyncTrigger};
use anyhow::{Context, Result};
use std::time::Duration;

/// Period of the automatic sync timer.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

// ============================================================================
// SYNC REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub fetched: usize,
    pub merge: MergeReport,
}

impl SyncReport {
    pub fn summary(&self) -> String {
        format!("fetched {} remote quote(s); {}", self.fetched, self.merge.summary())
    }
}

// ============================================================================
// SYNC ENGINE
// ============================================================================

pub struct SyncEngine {
    remote: RemoteSource,
    engine: MergeEngine,
}

impl SyncEngine {
    pub fn new(remote: RemoteSource) -> Self {
        SyncEngine {
            remote,
            engine: MergeEngine::new(),
        }
    }

    pub fn remote(&self) -> &RemoteSource {
        &self.remote
    }

    /// Run one sync cycle.
    ///
    /// A fetch or decode failure propagates as an error; local state is
    /// untouched and the next trigger simply retries.
    pub async fn sync_once(&self, store: &QuoteStore, trigger: SyncTrigger) -> Result<SyncReport> {
        let incoming = self
            .remote
            .fetch_quotes()
            .await
            .context("failed to fetch remote quotes")?;

        self.apply_batch(store, &incoming, trigger)
    }

    /// Merge an incoming batch, persist the result, and record history.
    ///
    /// Shared by network sync and CSV import (the file plays the
    /// incoming role and obeys the same precedence rules).
    pub fn apply_batch(
        &self,
        store: &QuoteStore,
        incoming: &[Quote],
        trigger: SyncTrigger,
    ) -> Result<SyncReport> {
        let mut quotes = store.load_quotes();
        let merge = self.engine.merge(&mut quotes, incoming);

        store.save_quotes(&quotes).context("failed to persist merged quotes")?;

        let record = SyncRecord::new(
            trigger,
            merge.incoming_count,
            merge.added,
            merge.updated,
            merge.conflicts.clone(),
        );
        store.record_sync(&record)?;

        tracing::info!("{}", merge.summary());

        Ok(SyncReport {
            fetched: incoming.len(),
            merge,
        })
    }

    /// Drive the automatic sync timer until the process exits.
    ///
    /// The first cycle lands one full period after start. Failed cycles
    /// are logged and skipped; there is no shutdown path.
    pub async fn run_periodic(&self, store: &QuoteStore, period: Duration) -> Result<()> {
        let mut ticker = tokio::time::interval(period);
        // interval() yields immediately; consume that tick so the first
        // cycle waits a full period.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.sync_once(store, SyncTrigger::Interval).await {
                Ok(report) => {
                    if report.merge.conflict_occurred() {
                        tracing::info!(
                            "{} conflict(s) resolved automatically, server data preferred",
                            report.merge.conflicts.len()
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!("sync cycle skipped: {err:#}");
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::seed_quotes;
    use crate::remote::RemoteSource;

    fn engine() -> SyncEngine {
        SyncEngine::new(RemoteSource::new("http://localhost:0/unused"))
    }

    #[test]
    fn test_apply_batch_merges_persists_and_records() {
        let store = QuoteStore::open_in_memory().unwrap();
        let engine = engine();

        let incoming = vec![
            // Conflicts with the seed's "Motivation" category
            Quote::new("Stay hungry, stay foolish.", "General"),
            Quote::new("Fresh from the server", "General"),
        ];

        let report = engine
            .apply_batch(&store, &incoming, SyncTrigger::Manual)
            .unwrap();

        assert_eq!(report.fetched, 2);
        assert_eq!(report.merge.added, 1);
        assert_eq!(report.merge.updated, 1);
        assert!(report.merge.conflict_occurred());

        // Persisted state reflects the merge
        let quotes = store.load_quotes();
        assert_eq!(quotes.len(), seed_quotes().len() + 1);
        assert!(quotes
            .iter()
            .any(|q| q.text == "Stay hungry, stay foolish." && q.category == "General"));

        // One history row, matching the report
        let history = store.recent_syncs(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].trigger, SyncTrigger::Manual);
        assert_eq!(history[0].added, 1);
        assert_eq!(history[0].updated, 1);
        assert_eq!(history[0].conflicts.len(), 1);

        println!("✅ {}", report.summary());
    }

    #[test]
    fn test_apply_batch_twice_is_idempotent() {
        let store = QuoteStore::open_in_memory().unwrap();
        let engine = engine();

        let incoming = vec![Quote::new("Stay hungry, stay foolish.", "General")];

        let first = engine
            .apply_batch(&store, &incoming, SyncTrigger::Interval)
            .unwrap();
        assert!(first.merge.conflict_occurred());

        let second = engine
            .apply_batch(&store, &incoming, SyncTrigger::Interval)
            .unwrap();
        assert!(!second.merge.conflict_occurred());
        assert!(!second.merge.changed());

        // Both cycles are in history regardless
        assert_eq!(store.recent_syncs(10).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_batch_still_records_cycle() {
        let store = QuoteStore::open_in_memory().unwrap();
        let engine = engine();

        let report = engine
            .apply_batch(&store, &[], SyncTrigger::Interval)
            .unwrap();

        assert_eq!(report.fetched, 0);
        assert!(!report.merge.changed());
        assert_eq!(store.load_quotes(), seed_quotes());
        assert_eq!(store.recent_syncs(10).unwrap().len(), 1);
    }
}
