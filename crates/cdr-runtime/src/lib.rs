//! Runtime layer for the CDR totals pipeline.
//!
//! Drives extraction, the bounded worker pool and the aggregator, and
//! sequences their shutdown so every record is merged exactly once.

pub mod coordinator;
pub mod pipeline;

pub use cdr_core as core;
pub use cdr_data as data;
