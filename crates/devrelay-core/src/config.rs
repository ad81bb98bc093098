//! Configuration module for DevRelay.
//!
//! Provides a typed configuration struct that maps to the YAML configuration
//! file, with loading, validation, defaults, and a builder pattern for
//! programmatic use by host applications.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{RelayError, Severity};

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for the DevRelay telemetry client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Application identifier assigned by the collector. Must be a
    /// hyphenated UUID.
    pub app_id: String,
    /// Base URL of the collector backend, without a trailing slash.
    pub backend_url: String,
    /// Version string reported with every payload.
    pub app_version: String,
    /// Breadcrumbs below this severity are dropped before they reach the
    /// trail. Captured failures are always processed regardless of the
    /// threshold.
    pub severity_threshold: Severity,
    /// When `false`, reports are formatted and logged locally but never
    /// transmitted.
    pub enable_delivery: bool,
    /// Connect timeout for crash/error deliveries, in seconds.
    pub connect_timeout_secs: u64,
    /// Read timeout for crash/error deliveries, in seconds.
    pub read_timeout_secs: u64,
    /// Connect + read timeout for discrete event deliveries, in seconds.
    pub event_timeout_secs: u64,
    /// Additional delivery attempts for discrete events after the first
    /// failure.
    pub max_event_retries: u32,
    /// Upper bound on concurrently in-flight discrete event deliveries.
    pub max_parallel_deliveries: usize,
    /// Interval of the primary-thread liveness watchdog, in seconds.
    pub watchdog_interval_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            backend_url: String::new(),
            app_version: "1.0.0".to_string(),
            severity_threshold: Severity::Info,
            enable_delivery: true,
            connect_timeout_secs: 10,
            read_timeout_secs: 10,
            event_timeout_secs: 8,
            max_event_retries: 2,
            max_parallel_deliveries: 8,
            watchdog_interval_secs: 1,
        }
    }
}

impl RelayConfig {
    /// Creates a configuration with the two mandatory fields set and all
    /// other values at their defaults.
    pub fn new(app_id: impl Into<String>, backend_url: impl Into<String>) -> Self {
        let mut base_url: String = backend_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            app_id: app_id.into(),
            backend_url: base_url,
            ..Default::default()
        }
    }

    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`RelayConfig::default`] on
    /// any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Validates the configuration for use at initialization time.
    ///
    /// Fails fast: an invalid application ID or empty backend URL rejects
    /// the whole initialize call before any state is touched.
    pub fn validate(&self) -> Result<(), RelayError> {
        let id = self.app_id.trim();
        if id.is_empty() {
            return Err(RelayError::InvalidAppId("(empty)".to_string()));
        }
        // Hyphenated UUID form only, matching what the collector issues.
        if id.len() != 36 || Uuid::try_parse(id).is_err() {
            return Err(RelayError::InvalidAppId(id.to_string()));
        }
        if self.backend_url.trim().is_empty() {
            return Err(RelayError::EmptyBackendUrl);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Builder-style setters
    // -----------------------------------------------------------------------

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn with_severity_threshold(mut self, threshold: Severity) -> Self {
        self.severity_threshold = threshold;
        self
    }

    pub fn with_delivery_enabled(mut self, enabled: bool) -> Self {
        self.enable_delivery = enabled;
        self
    }

    pub fn with_max_event_retries(mut self, retries: u32) -> Self {
        self.max_event_retries = retries;
        self
    }

    pub fn with_max_parallel_deliveries(mut self, bound: usize) -> Self {
        self.max_parallel_deliveries = bound.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_APP_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    #[test]
    fn test_new_strips_trailing_slash() {
        let config = RelayConfig::new(VALID_APP_ID, "https://collector.example.com/");
        assert_eq!(config.backend_url, "https://collector.example.com");
    }

    #[test]
    fn test_validate_accepts_uuid_app_id() {
        let config = RelayConfig::new(VALID_APP_ID, "https://collector.example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_app_id() {
        let config = RelayConfig::new("", "https://collector.example.com");
        assert_eq!(
            config.validate(),
            Err(RelayError::InvalidAppId("(empty)".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_malformed_app_id() {
        let config = RelayConfig::new("not-a-uuid", "https://collector.example.com");
        assert!(matches!(
            config.validate(),
            Err(RelayError::InvalidAppId(_))
        ));

        // Simple (non-hyphenated) form is rejected too
        let config = RelayConfig::new(
            "0f8fad5bd9cb469fa16570867728950e",
            "https://collector.example.com",
        );
        assert!(matches!(
            config.validate(),
            Err(RelayError::InvalidAppId(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_backend_url() {
        let config = RelayConfig::new(VALID_APP_ID, "");
        assert_eq!(config.validate(), Err(RelayError::EmptyBackendUrl));
    }

    #[test]
    fn test_builder_setters() {
        let config = RelayConfig::new(VALID_APP_ID, "https://c.example.com")
            .with_app_version("2.3.1")
            .with_severity_threshold(Severity::Debug)
            .with_delivery_enabled(false)
            .with_max_event_retries(5)
            .with_max_parallel_deliveries(0);

        assert_eq!(config.app_version, "2.3.1");
        assert_eq!(config.severity_threshold, Severity::Debug);
        assert!(!config.enable_delivery);
        assert_eq!(config.max_event_retries, 5);
        // Bound is clamped to at least one worker
        assert_eq!(config.max_parallel_deliveries, 1);
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "app_id: {VALID_APP_ID}\n\
             backend_url: https://collector.example.com\n\
             app_version: 0.9.0\n\
             severity_threshold: DEBUG\n\
             enable_delivery: true\n\
             connect_timeout_secs: 5\n\
             read_timeout_secs: 5\n\
             event_timeout_secs: 4\n\
             max_event_retries: 1\n\
             max_parallel_deliveries: 4\n\
             watchdog_interval_secs: 2"
        )
        .unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.app_id, VALID_APP_ID);
        assert_eq!(config.severity_threshold, Severity::Debug);
        assert_eq!(config.max_parallel_deliveries, 4);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = RelayConfig::load_or_default(Path::new("/nonexistent/devrelay.yaml"));
        assert_eq!(config.app_version, "1.0.0");
        assert!(config.enable_delivery);
    }
}
