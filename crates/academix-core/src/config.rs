//! Configuration module for the Academix client.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Academix client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub cache: CacheConfig,
    pub throttle: ThrottleConfig,
    pub logging: LoggingConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the course-delivery backend.
    pub base_url: String,
    /// Tenant identifier sent with every request (`X-Tenant-Id`).
    pub tenant_id: String,
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a cached payload may be served before it is considered stale.
    pub ttl_seconds: u64,
}

/// Global dispatch throttle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Milliseconds to keep the gate closed after a dispatched call settles.
    pub cooldown_ms: u64,
    /// Lower bound of the randomized re-admission delay, in milliseconds.
    pub jitter_min_ms: u64,
    /// Upper bound of the randomized re-admission delay, in milliseconds.
    pub jitter_max_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl ClientConfig {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`ClientConfig::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/academix/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("academix")
            .join("config.yaml")
    }

    /// Validates the configuration, returning all problems found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.backend.base_url.is_empty() {
            errors.push("backend.base_url must not be empty".to_string());
        }
        if self.backend.base_url.ends_with('/') {
            errors.push("backend.base_url must not end with a slash".to_string());
        }
        if self.backend.tenant_id.is_empty() {
            errors.push("backend.tenant_id must not be empty".to_string());
        }
        if self.cache.ttl_seconds == 0 {
            errors.push("cache.ttl_seconds must be greater than zero".to_string());
        }
        if self.throttle.jitter_min_ms > self.throttle.jitter_max_ms {
            errors.push("throttle.jitter_min_ms must not exceed jitter_max_ms".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.academix.dev/v1".to_string(),
            tenant_id: "default".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        // 5 minutes, matching the backend's catalog update cadence
        Self { ttl_seconds: 300 }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 150,
            jitter_min_ms: 30,
            jitter_max_ms: 120,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
