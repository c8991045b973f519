//! Client configuration for the authentication layer.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backend the development build ships with.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// How long a remote attempt may run before the offline fallback takes
/// over (seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Configuration for the auth client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the authentication backend.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Deadline for each remote call, in seconds. When it expires the
    /// attempt is treated as unavailable, not failed.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Root directory for durable client state. Defaults to the platform
    /// data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            data_dir: None,
        }
    }
}

impl AuthConfig {
    /// Defaults with environment overrides applied on top.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("IMAGO_API_URL") {
            if !url.is_empty() {
                config.api_base_url = url;
            }
        }
        if let Ok(secs) = std::env::var("IMAGO_AUTH_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse() {
                config.request_timeout_secs = parsed;
            }
        }
        if let Ok(dir) = std::env::var("IMAGO_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// File holding the durable storage scope.
    pub fn storage_file(&self) -> PathBuf {
        let dir = self.data_dir.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("io", "imago", "imago")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".imago"))
        });
        dir.join("auth_state.json")
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
