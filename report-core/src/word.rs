//! 256-bit ABI words
//!
//! Everything the contract layer exchanges is a 32-byte big-endian word,
//! written as a `0x`-prefixed hex string. Signed values use two's complement.

use crate::{Error, Result};
use primitive_types::U256;

/// Width of an ABI word in bytes
pub const WORD_BYTES: usize = 32;

/// Strip an optional `0x` prefix
pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Prefix hex-encoded bytes with `0x`
pub fn prefix_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a `0x` hex string or an unsigned decimal string into a word
pub fn parse_word(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        let digits = strip_0x(trimmed);
        if digits.is_empty() || digits.len() > 64 {
            return Err(Error::InvalidInput(format!("not a 256-bit hex word: {}", input)));
        }
        U256::from_str_radix(digits, 16)
            .map_err(|e| Error::InvalidInput(format!("bad hex word {}: {:?}", input, e)))
    } else {
        U256::from_dec_str(trimmed)
            .map_err(|e| Error::InvalidInput(format!("bad decimal word {}: {:?}", input, e)))
    }
}

/// Interpret a word as an unsigned value that must fit in `i128`
pub fn to_unsigned_i128(word: U256) -> Result<i128> {
    if word.bits() > 127 {
        return Err(Error::Range(format!("{} does not fit in 127 bits", to_hex(word))));
    }
    Ok(word.low_u128() as i128)
}

/// Interpret a word as a two's complement signed value that must fit in `i128`
pub fn to_signed_i128(word: U256) -> Result<i128> {
    if !word.bit(255) {
        return to_unsigned_i128(word);
    }
    let magnitude = (!word).overflowing_add(U256::one()).0;
    if magnitude.bits() > 127 {
        return Err(Error::Range(format!("{} does not fit in 127 bits", to_hex(word))));
    }
    Ok(-(magnitude.low_u128() as i128))
}

/// Two's complement word for a signed value
pub fn from_signed(value: i128) -> U256 {
    let magnitude = U256::from(value.unsigned_abs());
    if value < 0 {
        (!magnitude).overflowing_add(U256::one()).0
    } else {
        magnitude
    }
}

/// Minimal `0x` hex form (`0x0` for zero)
pub fn to_hex(word: U256) -> String {
    format!("0x{:x}", word)
}

/// Big-endian 32-byte encoding
pub fn to_bytes(word: U256) -> [u8; WORD_BYTES] {
    let mut buf = [0u8; WORD_BYTES];
    word.to_big_endian(&mut buf);
    buf
}

/// Signed decimal rendering of a two's complement word
pub fn to_signed_decimal(word: U256) -> String {
    if word.bit(255) {
        let magnitude = (!word).overflowing_add(U256::one()).0;
        format!("-{}", magnitude)
    } else {
        word.to_string()
    }
}

/// Decode a hex string into a byte buffer left-padded to a full word.
///
/// Inputs longer than a word are kept whole.
pub fn pad_left(input: &str) -> Result<Vec<u8>> {
    let digits = hex_digits(input)?;
    let width = (WORD_BYTES * 2).max(digits.len() + digits.len() % 2);
    let padded = format!("{:0>width$}", digits, width = width);
    Ok(hex::decode(padded)?)
}

/// Decode a hex string at its own width.
///
/// An odd digit count gets one leading zero nibble.
pub fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits = hex_digits(input)?;
    if digits.len() % 2 == 1 {
        return Ok(hex::decode(format!("0{}", digits))?);
    }
    Ok(hex::decode(digits)?)
}

fn hex_digits(input: &str) -> Result<&str> {
    let digits = strip_0x(input.trim());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidInput(format!("not a hex string: {}", input)));
    }
    Ok(digits)
}

/// Normalize a contract call return into a signed decimal string.
///
/// Hex returns are read as two's complement (`0xff..fe` is `-2`). Anything
/// that is not a number is passed through untouched.
pub fn normalize_call_return(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix('-') {
        return match U256::from_dec_str(rest) {
            Ok(word) if word.is_zero() => "0".to_string(),
            Ok(word) => format!("-{}", word),
            Err(_) => raw.to_string(),
        };
    }
    match parse_word(trimmed) {
        Ok(word) if trimmed.starts_with("0x") || trimmed.starts_with("0X") => {
            to_signed_decimal(word)
        }
        Ok(word) => word.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Whether a hex string holds a non-zero value.
///
/// Unparseable input counts as zero.
pub fn is_nonzero_hex(input: &str) -> bool {
    let digits = strip_0x(input.trim());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    digits.chars().any(|c| c != '0')
}
