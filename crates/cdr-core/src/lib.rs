//! Domain layer for the CDR totals pipeline.
//!
//! Holds the record and accumulator models, the per-record computation,
//! the error type, CLI settings and number formatting shared by the other
//! crates.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{CdrError, Result};
