//! Uploader configuration.
//!
//! Values come from `uploader.toml` (or the file named by `UPLOADER_CONFIG`)
//! and are then overridden by `UPLOADER_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::upload::{CompletionPolicy, ValidationRules, DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};

pub const CONFIG_ENV: &str = "UPLOADER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "uploader.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: {reason}")]
    Env { name: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Backend base URL; files are posted to `{api_url}/upload`.
    pub api_url: String,
    pub api_token: Option<String>,
    pub max_file_size: u64,
    pub accepted_extensions: Vec<String>,
    pub completion_policy: CompletionPolicy,
    pub request_timeout_secs: Option<u64>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            api_token: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            completion_policy: CompletionPolicy::default(),
            request_timeout_secs: None,
        }
    }
}

impl UploaderConfig {
    /// Loads the config file if there is one, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if explicit.is_some() || path.exists() {
            Self::from_file(&path)?
        } else {
            debug!("no config file found, using defaults");
            Self::default()
        };

        config.apply_env(|name| env::var(name).ok())?;
        config.validate()?;
        info!(api_url = %config.api_url, policy = ?config.completion_policy, "configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `UPLOADER_API_URL`, `UPLOADER_API_TOKEN` and
    /// `UPLOADER_MAX_FILE_SIZE` as returned by `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("UPLOADER_API_URL") {
            self.api_url = url;
        }
        if let Some(token) = lookup("UPLOADER_API_TOKEN") {
            self.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(size) = lookup("UPLOADER_MAX_FILE_SIZE") {
            self.max_file_size = size.parse().map_err(|e| ConfigError::Env {
                name: "UPLOADER_MAX_FILE_SIZE",
                reason: format!("{}", e),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_url must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        if self.accepted_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "accepted_extensions must not be empty".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::Invalid(
                "max_file_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.api_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules::new(self.accepted_extensions.iter().cloned(), self.max_file_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_client() {
        let config = UploaderConfig::default();
        assert_eq!(config.upload_url(), "http://localhost:8080/upload");
        assert_eq!(config.max_file_size, 100 * 1024 * 1024);
        assert_eq!(config.completion_policy, CompletionPolicy::AnySucceeded);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uploader.toml");
        std::fs::write(
            &path,
            r#"
api_url = "https://quiz.example.com/"
completion_policy = "all_succeeded"
request_timeout_secs = 30
"#,
        )
        .unwrap();

        let config = UploaderConfig::from_file(&path).unwrap();
        assert_eq!(config.upload_url(), "https://quiz.example.com/upload");
        assert_eq!(config.completion_policy, CompletionPolicy::AllSucceeded);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.accepted_extensions.len(), 4);
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uploader.toml");
        std::fs::write(&path, "completion_policy = \"sometimes\"").unwrap();

        assert!(matches!(
            UploaderConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("UPLOADER_API_URL", "http://10.0.0.2:9000"),
            ("UPLOADER_API_TOKEN", "dev-token"),
            ("UPLOADER_MAX_FILE_SIZE", "2048"),
        ]
        .into_iter()
        .collect();

        let mut config = UploaderConfig::default();
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_url, "http://10.0.0.2:9000");
        assert_eq!(config.api_token.as_deref(), Some("dev-token"));
        assert_eq!(config.validation_rules().max_file_size(), 2048);
    }

    #[test]
    fn bad_env_size_is_reported() {
        let mut config = UploaderConfig::default();
        let result = config.apply_env(|name| {
            (name == "UPLOADER_MAX_FILE_SIZE").then(|| "lots".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::Env {
                name: "UPLOADER_MAX_FILE_SIZE",
                ..
            })
        ));
    }

    #[test]
    fn validation_catches_bad_values() {
        let config = UploaderConfig {
            api_url: "localhost:8080".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = UploaderConfig {
            accepted_extensions: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
