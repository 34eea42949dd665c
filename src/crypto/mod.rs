//! Cryptographic operations for Ethereum identities.
//!
//! This module provides:
//! - Keccak-256 hashing, one-shot and streaming
//! - Private key generation and the strict key-file format
//! - Signing, public-key recovery and signature-value validation
//! - Account, CREATE and CREATE2 address derivation

mod address;
mod curve;
mod derive;
mod error;
mod hash;
mod key;
mod signature;

pub use address::Address;
pub use curve::{Curve, Secp256k1Curve};
pub use derive::{
    account_address, contract_address_by_nonce, contract_address_by_salt, preimage_address,
    salt_from_u64,
};
pub use error::CryptoError;
pub use hash::{hash_data, keccak256, keccak256_concat, Digest, KeccakState};
pub use key::{decode_key_file, load_key_file, save_key_file, PrivateKey};
pub use signature::{
    validate_signature_values, PublicKey, Signature, SignatureService, SIGNATURE_LENGTH,
};

/// Order of the secp256k1 group, big-endian.
pub const CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// `CURVE_ORDER / 2`, the largest `s` accepted under the low-s rule.
pub const HALF_CURVE_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_order_matches_backend() {
        assert_eq!(CURVE_ORDER, secp256k1::constants::CURVE_ORDER);
    }

    #[test]
    fn test_half_order_is_floor_half() {
        // n is odd, so 2 * (n / 2) + 1 == n
        let mut doubled = [0u8; 32];
        let mut carry = 1u16;
        for i in (0..32).rev() {
            let v = (HALF_CURVE_ORDER[i] as u16) * 2 + carry;
            doubled[i] = v as u8;
            carry = v >> 8;
        }
        assert_eq!(carry, 0);
        assert_eq!(doubled, CURVE_ORDER);
    }
}
