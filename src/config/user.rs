//! User configuration loading for nodekeep.
//!
//! User config location: $XDG_CONFIG_HOME/nodekeep/nodekeep.toml
//! Fallback: the platform config directory reported by `dirs`.

use std::path::PathBuf;

use thiserror::Error;

use super::settings::NodekeepSettings;

pub const CONFIG_FILE_NAME: &str = "nodekeep.toml";

#[derive(Debug, Error)]
pub enum UserConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type UserConfigResult<T> = std::result::Result<T, UserConfigError>;

/// Returns the path to the user configuration file.
///
/// The path is determined by:
/// 1. If $XDG_CONFIG_HOME is set: $XDG_CONFIG_HOME/nodekeep/nodekeep.toml
/// 2. Otherwise: `dirs::config_dir()`/nodekeep/nodekeep.toml
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg_config) if !xdg_config.is_empty() => PathBuf::from(xdg_config),
        _ => dirs::config_dir()?,
    };
    Some(base.join("nodekeep").join(CONFIG_FILE_NAME))
}

/// Load the user configuration file, if one exists.
pub fn load_user_config() -> UserConfigResult<Option<NodekeepSettings>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| UserConfigError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| UserConfigError::Parse { path, source })
}
