//! Account, CREATE and CREATE2 address derivation.
//!
//! - account:  keccak256(X || Y)[12..32]
//! - CREATE:   keccak256(rlp([creator, nonce]))[12..32]
//! - CREATE2:  keccak256(0xff || creator || salt || init_code_hash)[12..32]

use rlp::RlpStream;

use super::{keccak256, keccak256_concat, Address, Digest, PublicKey};

/// Leading byte of the CREATE2 preimage. An RLP list header is never 0xff,
/// so the two schemes cannot collide.
const CREATE2_PREFIX: u8 = 0xff;

/// Address of the account controlled by `public_key`.
#[inline]
pub fn account_address(public_key: &PublicKey) -> Address {
    Address::from_digest(&keccak256(public_key.as_xy()))
}

/// Address of the contract `creator` deploys with the given account nonce.
pub fn contract_address_by_nonce(creator: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&creator.as_bytes().as_slice());
    stream.append(&nonce);
    let encoded = stream.out();
    Address::from_digest(&keccak256(&encoded))
}

/// Address of the contract `creator` deploys via CREATE2.
/// Preimage: 0xff (1) || creator (20) || salt (32) || init_code_hash (32) = 85 bytes.
#[inline]
pub fn contract_address_by_salt(creator: &Address, salt: &[u8; 32], init_code_hash: &Digest) -> Address {
    let digest = keccak256_concat(&[
        &[CREATE2_PREFIX],
        creator.as_bytes(),
        salt,
        init_code_hash,
    ]);
    Address::from_digest(&digest)
}

/// Encodes a counter as a 32-byte big-endian CREATE2 salt.
#[inline]
pub fn salt_from_u64(n: u64) -> [u8; 32] {
    let mut salt = [0u8; 32];
    salt[24..].copy_from_slice(&n.to_be_bytes());
    salt
}

/// keccak256 of the minimal big-endian bytes of `n` (empty for zero), cut to
/// an address.
pub fn preimage_address(n: u64) -> Address {
    let bytes = n.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    Address::from_digest(&keccak256(&bytes[start..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{PrivateKey, SignatureService};

    const TEST_ADDR_HEX: &str = "970e8128ab834e8eac17ab8e3812f010678cf791";

    fn addr(s: &str) -> Address {
        Address::from_hex(s).unwrap()
    }

    #[test]
    fn test_contract_address_by_nonce() {
        let creator = addr(TEST_ADDR_HEX);
        let expected = [
            "333c3310824b7c685133f2bedb2ca4b8b4df633d",
            "8bda78331c916a08481428e4b07c96d3e916d165",
            "c9ddedf451bc62ce88bf9292afb13df35b670699",
        ];
        for (nonce, want) in expected.iter().enumerate() {
            assert_eq!(
                contract_address_by_nonce(&creator, nonce as u64),
                addr(want),
                "nonce {nonce}"
            );
        }
    }

    #[test]
    fn test_contract_address_by_salt_eip1014() {
        // EIP-1014 example 0: zero deployer, zero salt, init code 0x00
        let creator = Address::from_bytes([0u8; 20]);
        let init_code_hash = keccak256(&[0x00]);
        assert_eq!(
            contract_address_by_salt(&creator, &[0u8; 32], &init_code_hash),
            addr("4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38")
        );
    }

    #[test]
    fn test_salt_changes_address() {
        let creator = addr(TEST_ADDR_HEX);
        let hash = keccak256(b"init");
        let a = contract_address_by_salt(&creator, &salt_from_u64(1), &hash);
        let b = contract_address_by_salt(&creator, &salt_from_u64(2), &hash);
        assert_ne!(a, b);
        assert_eq!(a, contract_address_by_salt(&creator, &salt_from_u64(1), &hash));
    }

    #[test]
    fn test_salt_encoding() {
        let salt = salt_from_u64(5975038);
        assert!(salt[..24].iter().all(|&b| b == 0));
        assert_eq!(u64::from_be_bytes(salt[24..].try_into().unwrap()), 5975038);
    }

    #[test]
    fn test_account_address_known_keys() {
        let service = SignatureService::secp256k1();
        let one = PrivateKey::from_u64(1).unwrap();
        assert_eq!(
            account_address(&service.public_key(&one).unwrap()),
            addr("7e5f4552091a69125d5dfcb7b8c2659029395bdf")
        );
    }

    #[test]
    fn test_preimage_address() {
        assert_eq!(preimage_address(0), Address::from_digest(&keccak256(&[])));
        assert_eq!(preimage_address(0x0100), Address::from_digest(&keccak256(&[0x01, 0x00])));
    }
}
