//! Private keys and the plain-text key-file format.
//!
//! A key file holds exactly 64 hex characters, optionally followed by up to
//! two `\n`/`\r` bytes. Anything else is rejected with a specific error.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{CryptoError, CURVE_ORDER};

const KEY_HEX_LEN: usize = 64;
const MAX_TRAILING_NEWLINES: usize = 2;

/// A secp256k1 secret scalar in `(0, n)`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Draws a uniformly random key from the OS entropy source.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; 32];
        loop {
            OsRng
                .try_fill_bytes(&mut bytes)
                .map_err(|e| CryptoError::Entropy(e.to_string()))?;
            // rejection sampling keeps the distribution uniform
            if let Ok(key) = Self::from_bytes(bytes) {
                bytes.zeroize();
                return Ok(key);
            }
        }
    }

    /// Builds a key from a big-endian scalar, rejecting 0 and values >= n.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        if bytes.iter().all(|&b| b == 0) {
            return Err(CryptoError::InvalidKeyRange {
                reason: "zero or negative",
            });
        }
        if bytes >= CURVE_ORDER {
            return Err(CryptoError::InvalidKeyRange { reason: ">=N" });
        }
        Ok(Self(bytes))
    }

    /// Builds a key whose scalar is `n`. Fails only for `n == 0`.
    pub fn from_u64(n: u64) -> Result<Self, CryptoError> {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        Self::from_bytes(bytes)
    }

    /// Parses 64 hex characters, with an optional `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Self::from_hex_strict(s.strip_prefix("0x").unwrap_or(s))
    }

    /// Parses exactly 64 hex characters. A `0x` prefix is an invalid character.
    fn from_hex_strict(digits: &str) -> Result<Self, CryptoError> {
        let raw = digits.as_bytes();
        for (position, &b) in raw.iter().enumerate() {
            if nibble(b).is_none() {
                return Err(CryptoError::InvalidHexChar {
                    ch: char_at(digits, position, b),
                    position,
                });
            }
        }
        if raw.len() != KEY_HEX_LEN {
            return Err(CryptoError::InvalidKeyLength);
        }
        let mut bytes = [0u8; 32];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            if let (Some(hi), Some(lo)) = (nibble(pair[0]), nibble(pair[1])) {
                bytes[i] = (hi << 4) | lo;
            }
        }
        let key = Self::from_bytes(bytes);
        bytes.zeroize();
        key
    }

    /// Big-endian scalar bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Returns the key as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Decodes the contents of a key file.
pub fn decode_key_file(input: &[u8]) -> Result<PrivateKey, CryptoError> {
    // Reading stops at EOF or at the first control/space byte.
    let significant = input
        .iter()
        .take(KEY_HEX_LEN)
        .take_while(|&&b| b >= b'!')
        .count();
    if significant != KEY_HEX_LEN {
        return Err(CryptoError::KeyTooShort);
    }

    for (i, &b) in input[KEY_HEX_LEN..].iter().enumerate() {
        if b != b'\n' && b != b'\r' {
            return Err(CryptoError::TrailingGarbage { ch: b as char });
        }
        if i >= MAX_TRAILING_NEWLINES {
            return Err(CryptoError::KeyTooLong);
        }
    }

    let head = &input[..KEY_HEX_LEN];
    match std::str::from_utf8(head) {
        Ok(text) => PrivateKey::from_hex_strict(text),
        Err(_) => {
            // non-ASCII bytes can never be hex; report the first one
            let position = head.iter().position(|b| !b.is_ascii()).unwrap_or(0);
            Err(CryptoError::InvalidHexChar {
                ch: head[position] as char,
                position,
            })
        }
    }
}

/// Reads and decodes a key file.
pub fn load_key_file(path: impl AsRef<Path>) -> Result<PrivateKey, CryptoError> {
    let mut contents = std::fs::read(path)?;
    let key = decode_key_file(&contents);
    contents.zeroize();
    key
}

/// Writes `key` as 64 lowercase hex characters, owner-readable only on unix.
pub fn save_key_file(path: impl AsRef<Path>, key: &PrivateKey) -> Result<(), CryptoError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    let mut text = key.to_hex();
    let written = file.write_all(text.as_bytes());
    text.zeroize();
    written?;
    Ok(())
}

#[inline]
fn nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn char_at(s: &str, position: usize, byte: u8) -> char {
    s.get(position..)
        .and_then(|rest| rest.chars().next())
        .unwrap_or(byte as char)
}
