//! Configuration loading and management.

mod file;
mod paths;
mod types;
mod validate;

pub use file::{load_config, load_config_file, save_config};
pub use paths::ConfigLocation;
pub use types::{Config, InferenceConfig, ModelConfig, ServerConfig};
pub use validate::{parse_top_k, validate_config, validate_top_k};
