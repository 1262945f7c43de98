//! Where the configuration file is looked up.

use crate::constants::{APP_NAME, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Configuration file chosen for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Named with `--config` or `PLANTID_CONFIG`. Reading it when it does
    /// not exist is an error.
    Explicit(PathBuf),
    /// The per-user platform location. A missing file means defaults.
    Platform(PathBuf),
}

impl ConfigLocation {
    /// Use `explicit` if given, otherwise the platform location.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self::Explicit(path.to_path_buf())),
            None => platform_config_file().map(Self::Platform),
        }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Platform(path) => path,
        }
    }

    /// Whether the user named this file.
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

/// `config.toml` under the platform config dir, e.g. `~/.config/plantid/`.
fn platform_config_file() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .ok_or(Error::ConfigDirNotFound)
}
