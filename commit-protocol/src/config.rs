//! Configuration for the commit protocol

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Commit protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Commit window configuration
    pub window: WindowConfig,

    /// Resubmission configuration
    pub retry: RetryConfig,

    /// Log full call payloads and responses at debug level
    pub debug_reporting: bool,

    /// Report encoding configuration
    pub codec: report_core::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "commit-protocol".to_string(),
            window: WindowConfig::default(),
            retry: RetryConfig::default(),
            debug_reporting: false,
            codec: report_core::Config::default(),
        }
    }
}

/// Commit window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Period progress (percent) at which the commit phase ends
    pub commit_phase_end_percent: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            commit_phase_end_percent: 50.0,
        }
    }
}

/// Resubmission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Max dispatches per submission, including the first
    pub max_attempts: u32,

    /// Delay before the first resubmission (milliseconds)
    pub initial_retry_delay_ms: u64,

    /// Delay ceiling (milliseconds)
    pub max_retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_retry_delay_ms: 250,
            max_retry_delay_ms: 4_000,
        }
    }
}

impl RetryConfig {
    /// Retry immediately, as the contract layer expects
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_retry_delay_ms: 0,
            max_retry_delay_ms: 0,
        }
    }

    /// Delay before the first resubmission
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    /// Delay ceiling
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }
}

impl Config {
    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        let percent = self.window.commit_phase_end_percent;
        if !(0.0..=100.0).contains(&percent) {
            return Err(crate::Error::Config(format!(
                "commit_phase_end_percent must be within 0..=100, got {}",
                percent
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(crate::Error::Config("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config {
            codec: report_core::Config::from_env()?,
            ..Config::default()
        };

        if let Ok(attempts) = std::env::var("REPORTING_MAX_ATTEMPTS") {
            config.retry.max_attempts = attempts
                .parse()
                .map_err(|e| crate::Error::Config(format!("REPORTING_MAX_ATTEMPTS: {}", e)))?;
        }

        if let Ok(percent) = std::env::var("REPORTING_COMMIT_PHASE_END_PERCENT") {
            config.window.commit_phase_end_percent = percent.parse().map_err(|e| {
                crate::Error::Config(format!("REPORTING_COMMIT_PHASE_END_PERCENT: {}", e))
            })?;
        }

        if let Ok(flag) = std::env::var("REPORTING_DEBUG") {
            config.debug_reporting = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "commit-protocol");
        assert_eq!(config.window.commit_phase_end_percent, 50.0);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(!config.debug_reporting);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.commit_phase_end_percent = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            service_name = "reporter"
            debug_reporting = true

            [window]
            commit_phase_end_percent = 50.0

            [retry]
            max_attempts = 3
            initial_retry_delay_ms = 0
            max_retry_delay_ms = 0

            [codec]
            fixed_point = 64

            [codec.crypto]
            cipher = "aes-256-cbc"
            default_salt = "0x11111111111111111111111111111111"
            "#,
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.debug_reporting);
        assert_eq!(config.retry.initial_delay(), Duration::ZERO);
    }
}
