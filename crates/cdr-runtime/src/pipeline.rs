//! Streaming fan-out/reduce pipeline.
//!
//! The extractor runs on a blocking thread and hands each decoded
//! [`Session`] over a bounded channel. The async dispatcher registers every
//! session with the [`CompletionCoordinator`], which runs at most
//! `workers` computations at a time and feeds their results to the single
//! aggregator.

use std::future::Future;
use std::io::BufRead;
use std::path::Path;
use std::time::Instant;

use cdr_core::calculations::compute;
use cdr_core::models::{PartialResult, Session, Totals};
use cdr_core::settings::{default_workers, DEFAULT_QUEUE_DEPTH};
use cdr_core::{CdrError, Result};
use cdr_data::reader::{open_input, RecordExtractor, TokenSource, DEFAULT_RECORD_TAG};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::coordinator::CompletionCoordinator;

// ── Public types ──────────────────────────────────────────────────────────────

/// Tuning knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of concurrently running workers.
    pub workers: usize,
    /// Capacity of the session queue and of the result channel.
    pub queue_depth: usize,
    /// Element name of a record.
    pub record_tag: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            record_tag: DEFAULT_RECORD_TAG.to_string(),
        }
    }
}

/// Facts about a finished run, reported alongside the totals.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    /// ISO-8601 timestamp when the run completed.
    pub generated_at: String,
    /// Input path, when the run read from a file.
    pub input: Option<String>,
    /// Records decoded by the extractor.
    pub records_extracted: u64,
    /// Worker pool size used for the run.
    pub workers: usize,
    /// Wall-clock seconds from start to drained aggregator.
    pub elapsed_seconds: f64,
}

/// The complete output of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub totals: Totals,
    pub metadata: RunMetadata,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Open `path` and run the pipeline over it.
    ///
    /// An unreadable file fails with [`CdrError::FileRead`] before any work
    /// is started.
    pub async fn run_path(&self, path: &Path) -> Result<PipelineOutcome> {
        let input = open_input(path)?;
        let mut outcome = self.run(input).await?;
        outcome.metadata.input = Some(path.display().to_string());
        Ok(outcome)
    }

    /// Run the pipeline with the standard per-record computation.
    pub async fn run<R>(&self, input: R) -> Result<PipelineOutcome>
    where
        R: BufRead + Send + 'static,
    {
        self.run_with(input, |session| async move { compute(session) })
            .await
    }

    /// Run the pipeline with a custom worker.
    ///
    /// `worker` is called once per extracted session on the dispatcher; the
    /// returned future runs as its own task.
    pub async fn run_with<R, W, F>(&self, input: R, worker: W) -> Result<PipelineOutcome>
    where
        R: BufRead + Send + 'static,
        W: Fn(Session) -> F,
        F: Future<Output = PartialResult> + Send + 'static,
    {
        let started = Instant::now();
        let queue_depth = self.config.queue_depth.max(1);
        let (session_tx, mut session_rx) = mpsc::channel::<Session>(queue_depth);

        let record_tag = self.config.record_tag.clone();
        let extractor = tokio::task::spawn_blocking(move || {
            let mut tokens = TokenSource::new(input);
            let mut extractor = RecordExtractor::new(record_tag);
            extractor.extract(&mut tokens, |session| {
                session_tx
                    .blocking_send(session)
                    .map_err(|_| CdrError::PipelineClosed)
            })
        });

        let mut coordinator = CompletionCoordinator::start(self.config.workers, queue_depth);
        info!(workers = self.config.workers, queue_depth, "pipeline started");

        // Ends once the extractor has returned and its sender is dropped.
        while let Some(session) = session_rx.recv().await {
            if let Err(e) = coordinator.register(worker(session)).await {
                coordinator.abort();
                return Err(e);
            }
        }

        let extracted = match extractor.await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                coordinator.abort();
                return Err(e);
            }
            Err(e) => {
                coordinator.abort();
                return Err(CdrError::WorkerFailed(format!("extractor: {e}")));
            }
        };

        if coordinator.produced() != extracted {
            let produced = coordinator.produced();
            coordinator.abort();
            return Err(CdrError::IncompleteMerge {
                produced: extracted,
                merged: produced,
            });
        }

        let totals = coordinator.finish().await?;
        if totals.count != extracted {
            return Err(CdrError::IncompleteMerge {
                produced: extracted,
                merged: totals.count,
            });
        }

        let elapsed = started.elapsed().as_secs_f64();
        info!(
            records = extracted,
            excluded = totals.excluded,
            invalid_fields = totals.invalid_fields,
            elapsed_seconds = elapsed,
            "pipeline finished"
        );

        Ok(PipelineOutcome {
            totals,
            metadata: RunMetadata {
                generated_at: Utc::now().to_rfc3339(),
                input: None,
                records_extracted: extracted,
                workers: self.config.workers,
                elapsed_seconds: elapsed,
            },
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
