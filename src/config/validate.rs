//! Configuration validation.

use crate::config::Config;
use crate::constants::MAX_BATCH_SIZE;
use crate::error::{Error, Result};
use std::num::NonZeroUsize;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_top_k(config.inference.top_k).map_err(|e| Error::ConfigValidation {
        message: format!("inference.{e}"),
    })?;

    if !(1..=MAX_BATCH_SIZE).contains(&config.inference.batch_size) {
        return Err(Error::ConfigValidation {
            message: format!(
                "inference.batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                config.inference.batch_size
            ),
        });
    }

    if config.server.body_limit_bytes == 0 {
        return Err(Error::ConfigValidation {
            message: "server.body_limit_bytes must be at least 1".to_string(),
        });
    }

    if config.server.host.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "server.host must not be empty".to_string(),
        });
    }

    Ok(())
}

/// Check a `top_k` value is a positive integer.
pub fn validate_top_k(top_k: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(top_k).ok_or_else(|| Error::Validation {
        message: "top_k must be a positive integer, got 0".to_string(),
    })
}

/// Parse a user-supplied `top_k` string.
///
/// Accepts any positive integer; zero, negatives and non-numbers are rejected.
pub fn parse_top_k(raw: &str) -> Result<NonZeroUsize> {
    let invalid = || Error::Validation {
        message: format!("top_k must be a positive integer, got '{raw}'"),
    };
    let value: i64 = raw.trim().parse().map_err(|_| invalid())?;
    usize::try_from(value)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(invalid)
}
