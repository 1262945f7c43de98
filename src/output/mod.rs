//! Prediction ranking and response types.

mod ranking;
mod types;

pub use ranking::rank_top_k;
pub use types::{ItemError, ItemOutcome, Prediction};
