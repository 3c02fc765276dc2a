//! Completion tracking for the worker fan-out.
//!
//! [`CompletionCoordinator`] owns every piece of shared pipeline state: the
//! worker [`JoinSet`], the concurrency [`Semaphore`], the coordinator's own
//! result [`mpsc::Sender`] and the aggregator task. Shutdown happens in a
//! fixed order (workers joined, result channel closed, aggregator drained)
//! so a result can never be in flight when the totals are read.

use std::future::Future;
use std::sync::Arc;

use cdr_core::models::{PartialResult, Totals};
use cdr_core::{CdrError, Result};
use cdr_data::aggregator::Aggregator;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, warn};

// ── CompletionCoordinator ─────────────────────────────────────────────────────

pub struct CompletionCoordinator {
    /// In-flight worker tasks.
    workers: JoinSet<()>,
    /// Bounds the number of concurrently running workers.
    permits: Arc<Semaphore>,
    /// Template sender cloned into each worker. Dropping it is what closes
    /// the result channel once all workers are done.
    results: Option<mpsc::Sender<PartialResult>>,
    /// The single consumer of the result channel.
    aggregator: JoinHandle<Totals>,
    /// Number of workers registered (each delivers exactly one result).
    produced: u64,
}

impl CompletionCoordinator {
    /// Spawn the aggregator and prepare to accept workers.
    ///
    /// `concurrency` is clamped to at least one; `queue_depth` is the
    /// capacity of the result channel. Must be called inside a tokio runtime.
    pub fn start(concurrency: usize, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let aggregator = tokio::spawn(Aggregator::new().run(rx));

        Self {
            workers: JoinSet::new(),
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            results: Some(tx),
            aggregator,
            produced: 0,
        }
    }

    /// Number of workers registered so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Track and spawn one worker.
    ///
    /// Waits for a free permit first, so at most `concurrency` workers run at
    /// once and further records queue here. When this returns the worker is
    /// tracked and counted.
    pub async fn register<F>(&mut self, work: F) -> Result<()>
    where
        F: Future<Output = PartialResult> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| CdrError::PipelineClosed)?;
        let tx = self.results.clone().ok_or(CdrError::PipelineClosed)?;

        self.workers.spawn(async move {
            let result = work.await;
            if tx.send(result).await.is_err() {
                warn!("aggregator gone before result delivery");
            }
            drop(permit);
        });
        self.produced += 1;

        while let Some(joined) = self.workers.try_join_next() {
            check_worker(joined)?;
        }
        Ok(())
    }

    /// Wait for every worker, close the result channel, then wait for the
    /// aggregator to drain it.
    ///
    /// Fails with [`CdrError::IncompleteMerge`] if the aggregator merged a
    /// different number of results than were produced.
    pub async fn finish(mut self) -> Result<Totals> {
        debug!(in_flight = self.workers.len(), "waiting for workers");
        while let Some(joined) = self.workers.join_next().await {
            check_worker(joined)?;
        }

        // Every worker has sent and dropped its sender; this is the last one.
        drop(self.results.take());
        info!(produced = self.produced, "all workers finished; draining aggregator");

        let totals = (&mut self.aggregator)
            .await
            .map_err(|e| CdrError::AggregatorFailed(e.to_string()))?;

        if totals.count != self.produced {
            return Err(CdrError::IncompleteMerge {
                produced: self.produced,
                merged: totals.count,
            });
        }
        Ok(totals)
    }

    /// Cancel all in-flight work. Used when the input stream fails.
    pub fn abort(mut self) {
        warn!(in_flight = self.workers.len(), "aborting pipeline");
        self.workers.abort_all();
        self.results.take();
        self.aggregator.abort();
    }
}

fn check_worker(joined: std::result::Result<(), JoinError>) -> Result<()> {
    joined.map_err(|e| CdrError::WorkerFailed(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
