//! Batch classification pipeline.

mod batch;

pub use batch::{BatchOptions, BatchSummary, classify_batch};
