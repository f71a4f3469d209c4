//! Error types for report encoding

use thiserror::Error;

/// Result type for report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Report encoding errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input (bad hex, bad decimal, short field list)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Value outside the representable range, or an empty market range
    #[error("Range error: {0}")]
    Range(String),

    /// Cipher failure (bad key length, bad padding)
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::InvalidInput(format!("bad hex: {}", err))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::InvalidInput(format!("bad decimal: {}", err))
    }
}
