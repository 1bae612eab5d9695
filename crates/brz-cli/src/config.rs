//! Bridge configuration.
//!
//! The config file (`breeze.cfg`) is TOML:
//!
//! ```toml
//! endpoints = ["ws://10.0.0.1:7400", "ws://10.0.0.2:7400"]
//! connect_timeout_secs = 10
//! request_timeout_secs = 30
//! poll_interval_ms = 1000
//! contact_file = "/var/tmp/brzaddr.tmp"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Install prefix used to locate the default config.
pub const PACKAGE_PREFIX: &str = "/opt/breeze";

/// Name of the contact-list file kept between runs.
pub const CONTACT_FILE_NAME: &str = "brzaddr.tmp";

/// Default location of the bridge config file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    Path::new(PACKAGE_PREFIX).join("conf/breeze.cfg")
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// Connection settings for reaching the bridge service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Bridge WebSocket endpoints, tried in order.
    pub endpoints: Vec<String>,
    /// Per-endpoint connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Interval between readiness polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Where the contact list is loaded from and saved to.
    #[serde(default)]
    pub contact_file: Option<PathBuf>,
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ConfigAccess`] if the file cannot be read and
    /// [`CliError::Config`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ConfigAccess {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: Self =
            toml::from_str(content).map_err(|e| CliError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.endpoints.is_empty() {
            return Err(CliError::Config("endpoints cannot be empty".to_string()));
        }

        if let Some(bad) = self.endpoints.iter().find(|url| !is_ws_url(url)) {
            return Err(CliError::Config(format!(
                "invalid endpoint {bad}, must start with ws:// or wss://"
            )));
        }

        if self.connect_timeout_secs == 0 {
            return Err(CliError::Config(
                "connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(CliError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(CliError::Config(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Readiness poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Contact-list path: the configured one, or `brzaddr.tmp` in the
    /// system temp directory.
    #[must_use]
    pub fn contact_file(&self) -> PathBuf {
        self.contact_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(CONTACT_FILE_NAME))
    }
}

pub(crate) fn is_ws_url(url: &str) -> bool {
    url.starts_with("ws://") || url.starts_with("wss://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("failed to write temp file");
        file
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = BridgeConfig::from_toml(r#"endpoints = ["ws://127.0.0.1:7400"]"#)
            .expect("should parse minimal config");

        assert_eq!(config.endpoints, vec!["ws://127.0.0.1:7400".to_string()]);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.contact_file.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            endpoints = ["wss://bridge-a:7400", "ws://bridge-b:7400"]
            connect_timeout_secs = 3
            request_timeout_secs = 60
            poll_interval_ms = 250
            contact_file = "/var/tmp/contacts"
        "#;

        let config = BridgeConfig::from_toml(toml).expect("should parse full config");
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.contact_file(), PathBuf::from("/var/tmp/contacts"));
    }

    #[test]
    fn test_default_contact_file_in_temp_dir() {
        let config = BridgeConfig::from_toml(r#"endpoints = ["ws://a:1"]"#).expect("parse");
        assert_eq!(
            config.contact_file(),
            std::env::temp_dir().join(CONTACT_FILE_NAME)
        );
    }

    #[test]
    fn test_empty_endpoints_rejected() {
        let err = BridgeConfig::from_toml("endpoints = []").unwrap_err();
        assert!(err.to_string().contains("endpoints cannot be empty"));
    }

    #[test]
    fn test_non_ws_endpoint_rejected() {
        let err = BridgeConfig::from_toml(r#"endpoints = ["http://bridge:80"]"#).unwrap_err();
        assert!(err.to_string().contains("must start with ws://"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let toml = r#"
            endpoints = ["ws://a:1"]
            poll_interval_ms = 0
        "#;
        let err = BridgeConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = BridgeConfig::from_toml("endpoints = [").unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let file = create_temp_config(r#"endpoints = ["ws://127.0.0.1:7400"]"#);
        let config = BridgeConfig::from_file(file.path()).expect("should load");
        assert_eq!(config.endpoints.len(), 1);
    }

    #[test]
    fn test_missing_file_is_config_access_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = BridgeConfig::from_file(dir.path().join("missing.cfg")).unwrap_err();
        assert!(matches!(err, CliError::ConfigAccess { .. }));
        assert!(err.to_string().contains("missing.cfg"));
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(
            default_config_path(),
            PathBuf::from("/opt/breeze/conf/breeze.cfg")
        );
    }
}
