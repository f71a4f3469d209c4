//! Core types for report encoding
//!
//! All types are value-like and owned by the caller:
//! - Exact arithmetic (Decimal for report values)
//! - Fixed-point reports travel as ABI hex words

use crate::{word, Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    /// Yes/no market, reports are 1 or 2
    Binary,
    /// Outcome index market
    Categorical,
    /// Numeric range market
    Scalar,
}

impl MarketType {
    /// Lowercase protocol name
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Binary => "binary",
            MarketType::Categorical => "categorical",
            MarketType::Scalar => "scalar",
        }
    }
}

impl FromStr for MarketType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "binary" => Ok(MarketType::Binary),
            "categorical" => Ok(MarketType::Categorical),
            "scalar" => Ok(MarketType::Scalar),
            other => Err(Error::InvalidInput(format!("unknown market type: {}", other))),
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Report value in the protocol's fixed-point base.
///
/// Written on the wire as a minimal `0x` hex word; negative values use
/// 256-bit two's complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FixedPointReport(i128);

impl FixedPointReport {
    /// Wrap a raw fixed-point integer
    pub const fn new(value: i128) -> Self {
        Self(value)
    }

    /// Raw fixed-point integer
    pub const fn value(&self) -> i128 {
        self.0
    }

    /// Parse a word read as unsigned
    pub fn from_hex(input: &str) -> Result<Self> {
        word::parse_word(input)
            .and_then(word::to_unsigned_i128)
            .map(Self)
    }

    /// Parse a word read as two's complement
    pub fn from_hex_signed(input: &str) -> Result<Self> {
        word::parse_word(input)
            .and_then(word::to_signed_i128)
            .map(Self)
    }

    /// ABI hex form
    pub fn to_hex(&self) -> String {
        word::to_hex(word::from_signed(self.0))
    }

    /// 32-byte big-endian word
    pub fn to_word(&self) -> [u8; word::WORD_BYTES] {
        word::to_bytes(word::from_signed(self.0))
    }
}

impl fmt::Display for FixedPointReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<FixedPointReport> for String {
    fn from(report: FixedPointReport) -> Self {
        report.to_hex()
    }
}

impl TryFrom<String> for FixedPointReport {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex_signed(&value)
    }
}

/// Input to [`crate::ReportCodec::fix_report`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInput {
    /// Human-readable report value
    pub report: Decimal,

    /// Lower market bound (ignored for binary markets)
    pub min_value: Decimal,

    /// Upper market bound (ignored for binary markets)
    pub max_value: Decimal,

    /// Market type
    pub market_type: MarketType,

    /// Reporter marks the outcome as indeterminate
    #[serde(default)]
    pub is_indeterminate: bool,
}

impl ReportInput {
    /// Determinate report
    pub fn new(
        report: Decimal,
        min_value: Decimal,
        max_value: Decimal,
        market_type: MarketType,
    ) -> Self {
        Self {
            report,
            min_value,
            max_value,
            market_type,
            is_indeterminate: false,
        }
    }

    /// Mark as indeterminate
    pub fn indeterminate(mut self) -> Self {
        self.is_indeterminate = true;
        self
    }
}

/// Human-readable report recovered from a fixed-point value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedReport {
    /// Report in plain decimal notation
    pub report: String,

    /// Report is the indeterminate sentinel
    pub is_indeterminate: bool,
}

/// Byte input to the report cipher.
///
/// Raw bytes are used as-is; hex strings are left-padded to a full word,
/// except ciphertexts, which keep their own width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoInput<'a> {
    /// Raw byte buffer
    Bytes(&'a [u8]),
    /// `0x` hex string
    Hex(&'a str),
}

impl CryptoInput<'_> {
    /// Coerce to a byte buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            CryptoInput::Bytes(bytes) => Ok(bytes.to_vec()),
            CryptoInput::Hex(s) => word::pad_left(s),
        }
    }

    /// Byte buffer without word padding, for ciphertexts
    pub fn to_raw_bytes(&self) -> Result<Vec<u8>> {
        match self {
            CryptoInput::Bytes(bytes) => Ok(bytes.to_vec()),
            CryptoInput::Hex(s) => word::decode_hex(s),
        }
    }
}

impl<'a> From<&'a [u8]> for CryptoInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        CryptoInput::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for CryptoInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        CryptoInput::Bytes(bytes.as_slice())
    }
}

impl<'a> From<&'a str> for CryptoInput<'a> {
    fn from(s: &'a str) -> Self {
        CryptoInput::Hex(s)
    }
}

impl<'a> From<&'a String> for CryptoInput<'a> {
    fn from(s: &'a String) -> Self {
        CryptoInput::Hex(s.as_str())
    }
}

/// Key-derivation output belonging to a reporter account
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedSecret {
    /// Derived symmetric key
    pub derived_key: Vec<u8>,

    /// Salt used to encrypt the per-report salt
    pub salt: Vec<u8>,
}

impl DerivedSecret {
    /// Create from key and salt bytes
    pub fn new(derived_key: impl Into<Vec<u8>>, salt: impl Into<Vec<u8>>) -> Self {
        Self {
            derived_key: derived_key.into(),
            salt: salt.into(),
        }
    }
}

impl fmt::Debug for DerivedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSecret")
            .field("derived_key", &"<redacted>")
            .field("salt", &hex::encode(&self.salt))
            .finish()
    }
}

/// Report and salt recovered from an encrypted on-chain pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedReport {
    /// Plaintext salt (`0x` hex)
    pub salt: String,

    /// Plaintext fixed-point report (`0x` hex)
    pub report: String,

    /// Ethics flag
    pub ethics: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_type_parse() {
        assert_eq!("scalar".parse::<MarketType>().unwrap(), MarketType::Scalar);
        assert_eq!(MarketType::Categorical.to_string(), "categorical");
        assert!("Binary".parse::<MarketType>().is_err());
    }

    #[test]
    fn test_fixed_point_hex() {
        let report = FixedPointReport::new(1i128 << 63);
        assert_eq!(report.to_hex(), "0x8000000000000000");
        assert_eq!(FixedPointReport::from_hex("0x8000000000000000").unwrap(), report);

        let negative = FixedPointReport::new(-1);
        assert_eq!(negative.to_hex(), format!("0x{}", "f".repeat(64)));
        assert_eq!(FixedPointReport::from_hex_signed(&negative.to_hex()).unwrap(), negative);
        assert!(FixedPointReport::from_hex(&negative.to_hex()).is_err());
    }

    #[test]
    fn test_fixed_point_serde_as_hex() {
        let report = FixedPointReport::new(1);
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, "\"0x1\"");
        let back: FixedPointReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_secret_debug_redacts_key() {
        let secret = DerivedSecret::new(vec![7u8; 32], vec![1u8; 16]);
        let debug = format!("{:?}", secret);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("0707"));
    }
}
