use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;

/// Connection settings for a [`crate::Client`].
///
/// Every field is optional so that settings from several sources (flags,
/// environment, config file) can be layered with [`ClientConfig::or`].
/// The base URL must be present by the time a client is built.
///
/// Config file form:
///
/// ```json
/// { "base_url": "https://orchestrator.example", "api_key": "...", "timeout_ms": 30000 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
  #[serde(default)]
  pub base_url: Option<String>,
  #[serde(default)]
  pub api_key: Option<String>,
  #[serde(default)]
  pub timeout_ms: Option<u64>,
}

impl ClientConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: Some(base_url.into()),
      ..Self::default()
    }
  }

  pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
    self.api_key = Some(api_key.into());
    self
  }

  pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
    self.timeout_ms = Some(timeout_ms);
    self
  }

  /// Fill the fields left unset here from `fallback`.
  pub fn or(self, fallback: ClientConfig) -> ClientConfig {
    ClientConfig {
      base_url: self.base_url.or(fallback.base_url),
      api_key: self.api_key.or(fallback.api_key),
      timeout_ms: self.timeout_ms.or(fallback.timeout_ms),
    }
  }

  /// Api key, with an empty key treated as unset.
  pub fn api_key(&self) -> Option<&str> {
    self.api_key.as_deref().filter(|k| !k.is_empty())
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout_ms.map(Duration::from_millis)
  }

  /// Load a JSON config file. A missing file yields the empty config.
  pub fn load(path: &Path) -> Result<Self, ClientError> {
    if !path.exists() {
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ClientError::Config {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| ClientError::Config {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }
}
