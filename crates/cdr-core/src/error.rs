use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the CDR totals pipeline.
#[derive(Error, Debug)]
pub enum CdrError {
    /// The input file could not be opened or read from disk.
    #[error("Error opening file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XML token stream failed (I/O failure or malformed markup).
    #[error("Failed to read XML stream: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The input ended while an element was still open.
    #[error("Input ended inside an unclosed <{tag}> element")]
    TruncatedDocument { tag: String },

    /// A worker task panicked or was cancelled before delivering its result.
    #[error("Worker task failed: {0}")]
    WorkerFailed(String),

    /// The aggregator task panicked or was cancelled.
    #[error("Aggregator task failed: {0}")]
    AggregatorFailed(String),

    /// The aggregator finished with fewer (or more) merged results than were
    /// produced.
    #[error("Aggregation incomplete: {produced} results produced, {merged} merged")]
    IncompleteMerge { produced: u64, merged: u64 },

    /// A handoff channel was closed while work was still being dispatched.
    #[error("Pipeline channel closed unexpectedly")]
    PipelineClosed,

    /// A JSON report could not be serialised.
    #[error("Failed to serialise JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the CDR crates.
pub type Result<T> = std::result::Result<T, CdrError>;
