//! Configuration for report encoding

use crate::{crypto::CipherKind, fixed::FixedPointParams, Error, Result};
use serde::{Deserialize, Serialize};

/// Report encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fixed-point constants, written as the number of fractional bits
    #[serde(default)]
    pub fixed_point: FixedPointParams,

    /// Report cipher configuration
    #[serde(default)]
    pub crypto: CryptoConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fixed_point: FixedPointParams::default(),
            crypto: CryptoConfig::default(),
        }
    }
}

/// Report cipher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Cipher for report payloads
    pub cipher: CipherKind,

    /// Salt used when none is supplied (hex, at least 16 bytes)
    pub default_salt: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            cipher: CipherKind::Aes256Cbc,
            default_salt: "0x11111111111111111111111111111111".to_string(),
        }
    }
}

impl Config {
    /// Parse from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(bits) = std::env::var("REPORTING_FIXED_POINT_BITS") {
            let bits = bits
                .parse::<u32>()
                .map_err(|e| Error::Config(format!("REPORTING_FIXED_POINT_BITS: {}", e)))?;
            config.fixed_point = FixedPointParams::new(bits)?;
        }

        if let Ok(cipher) = std::env::var("REPORTING_CIPHER") {
            config.crypto.cipher = cipher.parse()?;
        }

        if let Ok(salt) = std::env::var("REPORTING_DEFAULT_SALT") {
            config.crypto.default_salt = salt;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fixed_point.fractional_bits(), 64);
        assert_eq!(config.crypto.cipher, CipherKind::Aes256Cbc);
        assert_eq!(config.crypto.default_salt.len(), 34);
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            fixed_point = 32

            [crypto]
            cipher = "aes-128-ctr"
            default_salt = "0x22222222222222222222222222222222"
            "#,
        )
        .unwrap();
        assert_eq!(config.fixed_point.fractional_bits(), 32);
        assert_eq!(config.crypto.cipher, CipherKind::Aes128Ctr);
    }

    #[test]
    fn test_from_toml_defaults_and_errors() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.fixed_point, FixedPointParams::default());

        assert!(Config::from_toml("fixed_point = 200").is_err());
        assert!(Config::from_toml("[crypto]\ncipher = \"rot13\"\ndefault_salt = \"0x11\"").is_err());
    }
}
