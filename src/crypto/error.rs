//! Errors raised by key handling, signing and recovery.

use std::io;

/// Errors from the crypto layer.
///
/// Key-file messages are kept byte-exact since tooling matches on them.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key file too short, want 64 hex characters")]
    KeyTooShort,

    #[error("key file too long, want 64 hex characters")]
    KeyTooLong,

    #[error("invalid hex character {ch:?} in private key")]
    InvalidHexChar { ch: char, position: usize },

    #[error("invalid character {ch:?} at end of key file")]
    TrailingGarbage { ch: char },

    #[error("invalid length, need 256 bits")]
    InvalidKeyLength,

    #[error("invalid private key, {reason}")]
    InvalidKeyRange { reason: &'static str },

    #[error("hash is required to be exactly 32 bytes ({0})")]
    InvalidDigestLength(usize),

    #[error("no private key supplied")]
    MissingKey,

    #[error("{0}")]
    InvalidSignatureShape(&'static str),

    #[error("invalid secp256k1 public key")]
    InvalidPublicKey,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("secp256k1: {0}")]
    Backend(#[from] secp256k1::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
