//! Single-writer reduction of per-record results into [`Totals`].

use cdr_core::models::{PartialResult, Totals};
use tokio::sync::mpsc;
use tracing::debug;

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Owns the [`Totals`] accumulator for the lifetime of a pipeline run.
///
/// Nothing else holds a reference to the totals while the aggregator is
/// running; the value is handed back by [`Aggregator::run`] or
/// [`Aggregator::into_totals`] once every result has been merged.
#[derive(Debug, Default)]
pub struct Aggregator {
    totals: Totals,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one result. Every result must be merged exactly once.
    pub fn merge(&mut self, result: PartialResult) {
        self.totals.merge(&result);
    }

    /// Number of results merged so far.
    pub fn merged(&self) -> u64 {
        self.totals.count
    }

    /// Give up ownership of the accumulated totals.
    pub fn into_totals(self) -> Totals {
        self.totals
    }

    /// Receive and merge results until the channel is closed and empty.
    ///
    /// The channel closes only when every sender has been dropped, so there
    /// is no separate shutdown signal to race against pending results.
    pub async fn run(mut self, mut results: mpsc::Receiver<PartialResult>) -> Totals {
        while let Some(result) = results.recv().await {
            self.merge(result);
        }
        debug!(
            merged = self.merged(),
            excluded = self.totals.excluded,
            "aggregator drained"
        );
        self.totals
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cdr_core::models::{Charges, Direction};

    fn result(direction: Direction, duration: f64, total: f64) -> PartialResult {
        PartialResult {
            direction,
            charges: Charges {
                duration,
                total_charges: total,
                ..Charges::default()
            },
            invalid_fields: 0,
        }
    }

    fn aggregate(results: impl IntoIterator<Item = PartialResult>) -> Totals {
        let mut aggregator = Aggregator::new();
        results.into_iter().for_each(|r| aggregator.merge(r));
        aggregator.into_totals()
    }

    fn example_results() -> Vec<PartialResult> {
        vec![
            result(Direction::Inbound, 10.0, 1.50),
            result(Direction::Inbound, 5.0, 2.25),
            result(Direction::Outbound, 20.0, 3.00),
        ]
    }

    #[test]
    fn test_aggregate_example_records() {
        let totals = aggregate(example_results());

        assert_eq!(totals.count, 3);
        assert!((totals.total_charges.inbound - 3.75).abs() < 1e-9);
        assert!((totals.total_charges.outbound - 3.00).abs() < 1e-9);
        assert_eq!(totals.duration.inbound, 15.0);
        assert_eq!(totals.duration.outbound, 20.0);
        assert_eq!(totals.calls.inbound, 2);
        assert_eq!(totals.calls.outbound, 1);
    }

    #[test]
    fn test_aggregate_order_independent() {
        let forward = aggregate(example_results());
        let reverse = aggregate(example_results().into_iter().rev());
        assert_eq!(forward.count, reverse.count);
        assert!((forward.total_charges.total() - reverse.total_charges.total()).abs() < 1e-9);
        assert_eq!(forward.duration, reverse.duration);
    }

    #[test]
    fn test_aggregate_empty() {
        let totals = aggregate(Vec::<PartialResult>::new());
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_merged_tracks_count() {
        let mut aggregator = Aggregator::new();
        aggregator.merge(result(Direction::Unknown, 0.0, 0.0));
        aggregator.merge(result(Direction::Inbound, 1.0, 1.0));
        assert_eq!(aggregator.merged(), 2);
        assert_eq!(aggregator.into_totals().excluded, 1);
    }

    #[tokio::test]
    async fn test_run_drains_results_sent_before_close() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(Aggregator::new().run(rx));

        for r in example_results() {
            tx.send(r).await.unwrap();
        }
        drop(tx);

        let totals = handle.await.unwrap();
        assert_eq!(totals.count, 3);
    }

    #[tokio::test]
    async fn test_run_waits_for_every_sender() {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(Aggregator::new().run(rx));

        let mut senders = Vec::new();
        for _ in 0..50 {
            let tx = tx.clone();
            senders.push(tokio::spawn(async move {
                tokio::task::yield_now().await;
                tx.send(result(Direction::Outbound, 1.0, 0.5)).await.unwrap();
            }));
        }
        drop(tx);
        for s in senders {
            s.await.unwrap();
        }

        let totals = handle.await.unwrap();
        assert_eq!(totals.count, 50);
        assert_eq!(totals.duration.outbound, 50.0);
    }

    #[tokio::test]
    async fn test_run_with_no_results() {
        let (tx, rx) = mpsc::channel::<PartialResult>(1);
        drop(tx);
        let totals = Aggregator::new().run(rx).await;
        assert_eq!(totals.count, 0);
    }
}
