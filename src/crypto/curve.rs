//! Elliptic-curve capability used by the signature service.
//!
//! The rest of the crate only talks to [`Curve`]; [`Secp256k1Curve`] is the
//! production implementation backed by libsecp256k1.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, Secp256k1};

use super::{CryptoError, Digest, PrivateKey, PublicKey, Signature};

/// Point multiplication, recoverable ECDSA and verification.
pub trait Curve: Send + Sync {
    /// Derives the public point for `key`.
    fn public_key(&self, key: &PrivateKey) -> Result<PublicKey, CryptoError>;

    /// Signs a 32-byte digest, returning `r`, `s` and a recovery id in {0, 1}.
    fn sign_recoverable(&self, digest: &Digest, key: &PrivateKey)
        -> Result<Signature, CryptoError>;

    /// Recovers the public point that produced `signature` over `digest`.
    fn recover(&self, digest: &Digest, signature: &Signature) -> Result<PublicKey, CryptoError>;

    /// Verifies a 64-byte `r || s` signature. High-s signatures are rejected.
    fn verify(&self, public_key: &PublicKey, digest: &Digest, rs: &[u8; 64]) -> bool;

    /// Returns true if the point lies on the curve.
    fn is_on_curve(&self, public_key: &PublicKey) -> bool;
}

/// [`Curve`] backed by the `secp256k1` crate.
pub struct Secp256k1Curve {
    ctx: Secp256k1<All>,
}

impl Secp256k1Curve {
    pub fn new() -> Self {
        Self {
            ctx: Secp256k1::new(),
        }
    }

    fn to_backend_key(public_key: &PublicKey) -> Result<secp256k1::PublicKey, CryptoError> {
        secp256k1::PublicKey::from_slice(&public_key.to_uncompressed())
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    fn from_backend_key(public_key: &secp256k1::PublicKey) -> PublicKey {
        let serialized = public_key.serialize_uncompressed();
        let mut xy = [0u8; 64];
        xy.copy_from_slice(&serialized[1..]);
        PublicKey::from_xy(xy)
    }
}

impl Default for Secp256k1Curve {
    fn default() -> Self {
        Self::new()
    }
}

impl Curve for Secp256k1Curve {
    fn public_key(&self, key: &PrivateKey) -> Result<PublicKey, CryptoError> {
        let secret = secp256k1::SecretKey::from_slice(key.as_bytes())?;
        let public = secp256k1::PublicKey::from_secret_key(&self.ctx, &secret);
        Ok(Self::from_backend_key(&public))
    }

    fn sign_recoverable(
        &self,
        digest: &Digest,
        key: &PrivateKey,
    ) -> Result<Signature, CryptoError> {
        let secret = secp256k1::SecretKey::from_slice(key.as_bytes())?;
        let message = Message::from_digest(*digest);
        let signature = self.ctx.sign_ecdsa_recoverable(&message, &secret);
        let (recovery_id, compact) = signature.serialize_compact();
        // libsecp256k1 normalizes s, and ids 2/3 need r >= n - p
        let v = u8::try_from(recovery_id.to_i32())
            .ok()
            .filter(|v| *v <= 1)
            .ok_or(CryptoError::InvalidSignatureShape(
                "invalid signature recovery id",
            ))?;
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        Ok(Signature::new(r, s, v))
    }

    fn recover(&self, digest: &Digest, signature: &Signature) -> Result<PublicKey, CryptoError> {
        let recovery_id = RecoveryId::from_i32(i32::from(signature.v()))?;
        let bytes = signature.to_bytes();
        let recoverable = RecoverableSignature::from_compact(&bytes[..64], recovery_id)?;
        let message = Message::from_digest(*digest);
        let public = self.ctx.recover_ecdsa(&message, &recoverable)?;
        Ok(Self::from_backend_key(&public))
    }

    fn verify(&self, public_key: &PublicKey, digest: &Digest, rs: &[u8; 64]) -> bool {
        let Ok(public) = Self::to_backend_key(public_key) else {
            return false;
        };
        let Ok(signature) = secp256k1::ecdsa::Signature::from_compact(rs) else {
            return false;
        };
        let message = Message::from_digest(*digest);
        self.ctx.verify_ecdsa(&message, &signature, &public).is_ok()
    }

    fn is_on_curve(&self, public_key: &PublicKey) -> bool {
        Self::to_backend_key(public_key).is_ok()
    }
}
