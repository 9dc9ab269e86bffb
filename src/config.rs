//! Client configuration loaded from TOML with env overrides.
//!
//! See `ClientConfig` for the expected schema. Everything has a default
//! that works against a local backend, so no config file is required.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend endpoint and transport settings.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Bounds for the submit-then-poll execution path. A sandboxed runner
/// cannot be assumed to return promptly, so both are mandatory.
#[derive(Clone, Debug, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_execution_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_execution_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Where the JSON snapshot store keeps per-user files. `None` means the
/// caller wants an in-memory store.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:8002".into()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_execution_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// Load `ClientConfig` from MLQUEST_CONFIG_PATH, then apply env overrides.
/// On any parsing/IO error the defaults are used; a broken config file
/// never takes the client down.
pub fn load_client_config_from_env() -> ClientConfig {
    let mut cfg = match std::env::var("MLQUEST_CONFIG_PATH") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(s) => match toml::from_str::<ClientConfig>(&s) {
                Ok(cfg) => {
                    info!(target: "mlquest_client", %path, "Loaded client config (TOML)");
                    cfg
                }
                Err(e) => {
                    error!(target: "mlquest_client", %path, error = %e, "Failed to parse TOML config; using defaults");
                    ClientConfig::default()
                }
            },
            Err(e) => {
                error!(target: "mlquest_client", %path, error = %e, "Failed to read TOML config file; using defaults");
                ClientConfig::default()
            }
        },
        Err(_) => ClientConfig::default(),
    };

    if let Ok(url) = std::env::var("MLQUEST_API_BASE_URL") {
        cfg.api.base_url = url;
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_work_without_any_config() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.api.base_url, "http://localhost:8002");
        assert_eq!(cfg.api.request_timeout(), Duration::from_secs(20));
        assert_eq!(cfg.execution.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.execution.poll_interval(), Duration::from_millis(500));
        assert!(cfg.storage.dir.is_none());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://learn.example.org"

            [execution]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "https://learn.example.org");
        assert_eq!(cfg.api.request_timeout_secs, 20);
        assert_eq!(cfg.execution.timeout_secs, 5);
        assert_eq!(cfg.execution.poll_interval_ms, 500);
    }
}
