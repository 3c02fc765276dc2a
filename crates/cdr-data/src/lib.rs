//! Data layer for the CDR totals pipeline.
//!
//! Streams call-detail records out of an XML document and reduces the
//! per-record results into a single [`cdr_core::models::Totals`].

pub mod aggregator;
pub mod reader;

pub use cdr_core as core;
