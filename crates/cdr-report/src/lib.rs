//! Report rendering for CDR totals.
//!
//! Builds the plain-text summary and itemized tables and the JSON form of a
//! pipeline outcome.

pub mod report;
pub mod table_view;

pub use cdr_core as core;
