//! Augur Report Core
//!
//! Encoding and encryption of prediction-market outcome reports.
//!
//! # Architecture
//!
//! - **Fixed-point codec**: rescales report values into the protocol's
//!   fixed-point base and back, with indeterminate sentinels
//! - **Words**: 256-bit ABI word parsing and formatting
//! - **Crypto**: commit hash and symmetric report encryption

#![forbid(unsafe_code)]
//!
//! # Invariants
//!
//! - A non-indeterminate report never encodes to the indeterminate sentinel
//! - A zero rescaled scalar/categorical report encodes to `0x1`, never `0x0`
//! - `decrypt_report(encrypt_report(r, k, s), k, s) == r`

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod fixed;
pub mod types;
pub mod word;

// Re-exports
pub use config::Config;
pub use crypto::ReportCrypto;
pub use error::{Error, Result};
pub use fixed::{FixedPointParams, ReportCodec};
pub use types::{
    CryptoInput, DecodedReport, DecryptedReport, DerivedSecret, FixedPointReport, MarketType,
    ReportInput,
};
