//! Mapping from a search candidate to the address it produces.

use zeroize::Zeroizing;

use crate::crypto::{
    contract_address_by_nonce, contract_address_by_salt, keccak256, preimage_address,
    salt_from_u64, Address, CryptoError, Curve, Digest, PrivateKey, Secp256k1Curve,
    SignatureService,
};

/// Derives the address for one candidate. Called from many threads at once.
pub trait CandidateEvaluator: Sync {
    fn evaluate(&self, candidate: u64) -> Result<Address, CryptoError>;
}

impl<F> CandidateEvaluator for F
where
    F: Fn(u64) -> Address + Sync,
{
    #[inline]
    fn evaluate(&self, candidate: u64) -> Result<Address, CryptoError> {
        Ok(self(candidate))
    }
}

/// CREATE2: the candidate is the salt, as a 32-byte big-endian integer.
#[derive(Debug, Clone)]
pub struct SaltEvaluator {
    factory: Address,
    init_code_hash: Digest,
}

impl SaltEvaluator {
    pub fn new(factory: Address, init_code_hash: Digest) -> Self {
        Self {
            factory,
            init_code_hash,
        }
    }

    /// Hashes `init_code` to build the evaluator.
    pub fn from_init_code(factory: Address, init_code: &[u8]) -> Self {
        Self::new(factory, keccak256(init_code))
    }

    pub fn init_code_hash(&self) -> &Digest {
        &self.init_code_hash
    }
}

impl CandidateEvaluator for SaltEvaluator {
    #[inline]
    fn evaluate(&self, candidate: u64) -> Result<Address, CryptoError> {
        Ok(contract_address_by_salt(
            &self.factory,
            &salt_from_u64(candidate),
            &self.init_code_hash,
        ))
    }
}

/// CREATE: the candidate is the creator's account nonce.
#[derive(Debug, Clone)]
pub struct NonceEvaluator {
    creator: Address,
}

impl NonceEvaluator {
    pub fn new(creator: Address) -> Self {
        Self { creator }
    }
}

impl CandidateEvaluator for NonceEvaluator {
    #[inline]
    fn evaluate(&self, candidate: u64) -> Result<Address, CryptoError> {
        Ok(contract_address_by_nonce(&self.creator, candidate))
    }
}

/// Raw preimage search: `keccak256(minimal big-endian candidate)[12..32]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreimageEvaluator;

impl CandidateEvaluator for PreimageEvaluator {
    #[inline]
    fn evaluate(&self, candidate: u64) -> Result<Address, CryptoError> {
        Ok(preimage_address(candidate))
    }
}

/// Private-key search: the key for candidate `c` is `offset + c`.
///
/// With a random offset the keyspace walked is unpredictable while the
/// search itself stays sequential. When `contract_nonce` is set the address
/// tested is the contract that account deploys at that nonce.
pub struct KeyEvaluator<C = Secp256k1Curve> {
    service: SignatureService<C>,
    offset: Zeroizing<[u8; 32]>,
    contract_nonce: Option<u64>,
}

impl KeyEvaluator<Secp256k1Curve> {
    /// Starts from a fresh random offset.
    pub fn random() -> Result<Self, CryptoError> {
        let base = PrivateKey::generate()?;
        Ok(Self::with_offset(SignatureService::secp256k1(), base.to_bytes()))
    }
}

impl<C: Curve> KeyEvaluator<C> {
    pub fn with_offset(service: SignatureService<C>, offset: [u8; 32]) -> Self {
        Self {
            service,
            offset: Zeroizing::new(offset),
            contract_nonce: None,
        }
    }

    /// Tests the address of the contract deployed at `nonce` instead of the
    /// account address.
    pub fn contract_at_nonce(mut self, nonce: u64) -> Self {
        self.contract_nonce = Some(nonce);
        self
    }

    pub fn contract_nonce(&self) -> Option<u64> {
        self.contract_nonce
    }

    /// The private key for `candidate`.
    pub fn key_for(&self, candidate: u64) -> Result<PrivateKey, CryptoError> {
        let mut scalar = Zeroizing::new(*self.offset);
        let mut carry = candidate;
        for byte in scalar.iter_mut().rev() {
            if carry == 0 {
                break;
            }
            let sum = u64::from(*byte) + (carry & 0xff);
            *byte = sum as u8;
            carry = (carry >> 8) + (sum >> 8);
        }
        if carry != 0 {
            return Err(CryptoError::InvalidKeyRange { reason: ">=N" });
        }
        PrivateKey::from_bytes(*scalar)
    }

    /// The account address for `candidate`, ignoring `contract_nonce`.
    pub fn account_for(&self, candidate: u64) -> Result<Address, CryptoError> {
        let key = self.key_for(candidate)?;
        self.service.address_of(&key)
    }
}

impl<C: Curve> CandidateEvaluator for KeyEvaluator<C> {
    fn evaluate(&self, candidate: u64) -> Result<Address, CryptoError> {
        let account = self.account_for(candidate)?;
        Ok(match self.contract_nonce {
            Some(nonce) => contract_address_by_nonce(&account, nonce),
            None => account,
        })
    }
}
