//! CLI argument validators.

use crate::config::parse_top_k;
use crate::constants::MAX_BATCH_SIZE;

/// Parse and validate a `top_k` value (positive integer).
pub fn parse_top_k_arg(s: &str) -> Result<usize, String> {
    parse_top_k(s).map(usize::from).map_err(|e| e.to_string())
}

/// Parse and validate a batch size (1 to `MAX_BATCH_SIZE`).
pub fn parse_batch_size(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(1..=MAX_BATCH_SIZE).contains(&value) {
        return Err(format!(
            "batch size must be between 1 and {MAX_BATCH_SIZE}, got {value}"
        ));
    }

    Ok(value)
}
