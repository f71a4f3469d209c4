//! Cryptographic operations for reports
//!
//! This module provides:
//! - Keccak-256 commit hash over `(from, salt, report, event)` words
//! - Symmetric report encryption keyed by a reporter's derived key
//! - Decryption of the `[encryptedReport, encryptedSalt, ethics]` triple

use crate::{
    config::CryptoConfig,
    types::{CryptoInput, DecryptedReport, DerivedSecret, FixedPointReport},
    word, Error, Result,
};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

/// IV length for both supported ciphers
pub const IV_BYTES: usize = 16;

/// Salt used when the caller supplies none.
///
/// Sixteen `0x11` bytes. Weak, but existing commitments were made with it.
pub const DEFAULT_SALT: [u8; IV_BYTES] = [0x11; IV_BYTES];

/// Symmetric cipher used for report payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CipherKind {
    /// AES-256 in CBC mode with PKCS#7 padding
    #[default]
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
    /// AES-128 in CTR mode, keyed by the first 16 key bytes
    #[serde(rename = "aes-128-ctr")]
    Aes128Ctr,
}

impl CipherKind {
    /// OpenSSL-style name
    pub fn name(&self) -> &'static str {
        match self {
            CipherKind::Aes256Cbc => "aes-256-cbc",
            CipherKind::Aes128Ctr => "aes-128-ctr",
        }
    }
}

impl FromStr for CipherKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aes-256-cbc" => Ok(CipherKind::Aes256Cbc),
            "aes-128-ctr" => Ok(CipherKind::Aes128Ctr),
            other => Err(Error::Config(format!("unsupported report cipher: {}", other))),
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Commit hash published during the commit phase.
///
/// Keccak-256 over the 32-byte words `from ‖ salt ‖ report ‖ event`.
pub fn make_hash(
    salt: CryptoInput<'_>,
    report: &FixedPointReport,
    event: &str,
    from: &str,
) -> Result<String> {
    let mut hasher = Keccak256::new();
    hasher.update(word::to_bytes(word::parse_word(from)?));
    hasher.update(salt_word(salt)?);
    hasher.update(report.to_word());
    hasher.update(word::to_bytes(word::parse_word(event)?));
    Ok(word::prefix_hex(&hasher.finalize()))
}

fn salt_word(salt: CryptoInput<'_>) -> Result<[u8; word::WORD_BYTES]> {
    let bytes = salt.to_bytes()?;
    if bytes.len() > word::WORD_BYTES {
        return Err(Error::InvalidInput(format!(
            "salt is {} bytes, at most {} allowed",
            bytes.len(),
            word::WORD_BYTES
        )));
    }
    let mut buf = [0u8; word::WORD_BYTES];
    buf[word::WORD_BYTES - bytes.len()..].copy_from_slice(&bytes);
    Ok(buf)
}

/// Report cipher bound to a configured algorithm and default salt
#[derive(Debug, Clone)]
pub struct ReportCrypto {
    cipher: CipherKind,
    default_salt: Vec<u8>,
}

impl ReportCrypto {
    /// Create from configuration
    pub fn new(config: &CryptoConfig) -> Result<Self> {
        let default_salt = hex::decode(word::strip_0x(&config.default_salt))?;
        if default_salt.len() < IV_BYTES {
            return Err(Error::Config(format!(
                "default salt must be at least {} bytes",
                IV_BYTES
            )));
        }

        Ok(Self {
            cipher: config.cipher,
            default_salt,
        })
    }

    /// Cipher in use
    pub fn cipher(&self) -> CipherKind {
        self.cipher
    }

    /// Encrypt a fixed-point report; returns `0x` hex ciphertext
    pub fn encrypt_report(
        &self,
        report: CryptoInput<'_>,
        key: CryptoInput<'_>,
        salt: Option<CryptoInput<'_>>,
    ) -> Result<String> {
        let plaintext = report.to_bytes()?;
        let key = key.to_bytes()?;
        let iv = self.iv(salt)?;

        let ciphertext = match self.cipher {
            CipherKind::Aes256Cbc => Aes256CbcEnc::new_from_slices(&key, &iv)
                .map_err(|_| invalid_key(self.cipher, key.len()))?
                .encrypt_padded_vec_mut::<Pkcs7>(&plaintext),
            CipherKind::Aes128Ctr => {
                let mut buf = plaintext;
                self.ctr(&key, &iv)?.apply_keystream(&mut buf);
                buf
            }
        };

        Ok(word::prefix_hex(&ciphertext))
    }

    /// Decrypt a report; returns the `0x` hex plaintext
    pub fn decrypt_report(
        &self,
        encrypted_report: CryptoInput<'_>,
        key: CryptoInput<'_>,
        salt: Option<CryptoInput<'_>>,
    ) -> Result<String> {
        let ciphertext = encrypted_report.to_raw_bytes()?;
        let key = key.to_bytes()?;
        let iv = self.iv(salt)?;

        let plaintext = match self.cipher {
            CipherKind::Aes256Cbc => Aes256CbcDec::new_from_slices(&key, &iv)
                .map_err(|_| invalid_key(self.cipher, key.len()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(|_| Error::Crypto("bad padding, wrong key or salt".to_string()))?,
            CipherKind::Aes128Ctr => {
                let mut buf = ciphertext;
                self.ctr(&key, &iv)?.apply_keystream(&mut buf);
                buf
            }
        };

        Ok(word::prefix_hex(&plaintext))
    }

    /// Decrypt an on-chain `[encryptedReport, encryptedSalt, ethics?]` triple.
    ///
    /// The salt is recovered first with the secret's own salt, then used as
    /// the IV source for the report.
    pub fn parse_and_decrypt_report(
        &self,
        fields: &[String],
        secret: &DerivedSecret,
    ) -> Result<DecryptedReport> {
        if fields.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "expected [encryptedReport, encryptedSalt, ethics?], got {} fields",
                fields.len()
            )));
        }

        let key = CryptoInput::Bytes(&secret.derived_key);
        let salt = self.decrypt_report(
            CryptoInput::Hex(&fields[1]),
            key,
            Some(CryptoInput::Bytes(&secret.salt)),
        )?;
        let report = self.decrypt_report(CryptoInput::Hex(&fields[0]), key, Some(CryptoInput::Hex(&salt)))?;

        Ok(DecryptedReport {
            salt,
            report,
            ethics: fields.get(2).map(|e| word::is_nonzero_hex(e)).unwrap_or(false),
        })
    }

    fn iv(&self, salt: Option<CryptoInput<'_>>) -> Result<Vec<u8>> {
        let mut bytes = match salt {
            Some(salt) => salt.to_bytes()?,
            None => Vec::new(),
        };
        if bytes.is_empty() {
            warn!("No salt supplied, encrypting report with the well-known default salt");
            bytes = self.default_salt.clone();
        }
        if bytes.len() < IV_BYTES {
            return Err(Error::Crypto(format!(
                "salt is {} bytes, need at least {}",
                bytes.len(),
                IV_BYTES
            )));
        }
        bytes.truncate(IV_BYTES);
        Ok(bytes)
    }

    fn ctr(&self, key: &[u8], iv: &[u8]) -> Result<Aes128Ctr> {
        let key = key.get(..16).ok_or_else(|| invalid_key(self.cipher, key.len()))?;
        Aes128Ctr::new_from_slices(key, iv).map_err(|_| invalid_key(self.cipher, key.len()))
    }
}

impl Default for ReportCrypto {
    fn default() -> Self {
        Self {
            cipher: CipherKind::default(),
            default_salt: DEFAULT_SALT.to_vec(),
        }
    }
}

fn invalid_key(cipher: CipherKind, len: usize) -> Error {
    Error::Crypto(format!("{} rejects a {}-byte key", cipher, len))
}
