//! Runtime settings of the demo API.
//!
//! Every field has a default, so the binary runs without a config file. Point
//! `RECIPE_CONFIG` at a JSON file to override some or all of them:
//!
//! ```json
//! { "baseUrl": "http://10.0.0.2:8080", "version": "example/v2" }
//! ```

use resource_framework::ApiVersion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "RECIPE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Scheme and authority the API is served under.
    pub base_url: String,
    pub group: String,
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234".to_string(),
            group: "zdns.cloud.example".to_string(),
            version: "example/v1".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the file named by `RECIPE_CONFIG`, or returns the defaults when it is unset.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// The authority part of `base_url`, used as the request host.
    pub fn host(&self) -> &str {
        let url = self.base_url.trim_end_matches('/');
        url.split_once("://").map_or(url, |(_, rest)| rest)
    }

    pub fn api_version(&self) -> ApiVersion {
        ApiVersion::new(self.group.as_str(), self.version.as_str())
    }
}
