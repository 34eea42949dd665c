//! Recoverable ECDSA signatures over Keccak-256 digests.

use std::fmt;

use super::{
    account_address, Address, CryptoError, Curve, Digest, PrivateKey, Secp256k1Curve, CURVE_ORDER,
    HALF_CURVE_ORDER,
};

/// Length of a serialized `r || s || v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset some external encodings add to the recovery id.
const LEGACY_V_OFFSET: u64 = 27;

/// An uncompressed secp256k1 point, stored as `X || Y`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 64]);

impl PublicKey {
    pub const fn from_xy(xy: [u8; 64]) -> Self {
        Self(xy)
    }

    /// Parses the 65-byte `0x04 || X || Y` encoding. Only the shape is checked
    /// here; use [`SignatureService::parse_public_key`] to check the point.
    pub fn from_uncompressed(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 65 || bytes[0] != 0x04 {
            return Err(CryptoError::InvalidPublicKey);
        }
        let mut xy = [0u8; 64];
        xy.copy_from_slice(&bytes[1..]);
        Ok(Self(xy))
    }

    pub fn x(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn y(&self) -> &[u8] {
        &self.0[32..]
    }

    /// The `X || Y` bytes hashed for address derivation.
    pub fn as_xy(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_uncompressed(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..].copy_from_slice(&self.0);
        out
    }

    /// The account address controlled by this key.
    pub fn address(&self) -> Address {
        account_address(self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(04{})", hex::encode(self.0))
    }
}

/// A recoverable signature: `r`, `s` and a recovery id in {0, 1}.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
    v: u8,
}

impl Signature {
    pub(crate) const fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Parses `r || s || v`. Rejects any length but 65 and any `v` but 0 or 1.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoError::InvalidSignatureShape("invalid signature length"));
        }
        let v = bytes[64];
        if v > 1 {
            return Err(CryptoError::InvalidSignatureShape(
                "invalid signature recovery id",
            ));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v })
    }

    /// Builds a signature from externally encoded values: `r` and `s` as
    /// minimal big-endian integers and `v` as 0/1 or 27/28.
    pub fn from_external_vrs(v: u64, r: &[u8], s: &[u8]) -> Result<Self, CryptoError> {
        let v = match v {
            0 | 1 => v,
            27 | 28 => v - LEGACY_V_OFFSET,
            _ => {
                return Err(CryptoError::InvalidSignatureShape(
                    "invalid signature recovery id",
                ))
            }
        };
        let r = to_word(r).ok_or(CryptoError::InvalidSignatureShape(
            "signature r exceeds 32 bytes",
        ))?;
        let s = to_word(s).ok_or(CryptoError::InvalidSignatureShape(
            "signature s exceeds 32 bytes",
        ))?;
        Ok(Self { r, s, v: v as u8 })
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Recovery id, 0 or 1.
    pub fn v(&self) -> u8 {
        self.v
    }

    /// `r || s`, the form taken by plain verification.
    pub fn rs(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..64].copy_from_slice(&self.rs());
        out[64] = self.v;
        out
    }

    /// See [`validate_signature_values`].
    pub fn is_valid(&self, require_low_s: bool) -> bool {
        validate_signature_values(self.v, &self.r, &self.s, require_low_s)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.to_bytes()))
    }
}

/// Checks that `v`, `r` and `s` are acceptable signature values.
///
/// `r` and `s` are big-endian integers of any length. `require_low_s` applies
/// the malleability rule `s <= n / 2`. Never fails; bad input gives `false`.
pub fn validate_signature_values(v: u8, r: &[u8], s: &[u8], require_low_s: bool) -> bool {
    if v > 1 {
        return false;
    }
    let (Some(r), Some(s)) = (to_word(r), to_word(s)) else {
        return false;
    };
    let zero = [0u8; 32];
    if r == zero || s == zero {
        return false;
    }
    if require_low_s && s > HALF_CURVE_ORDER {
        return false;
    }
    r < CURVE_ORDER && s < CURVE_ORDER
}

/// Left-pads a big-endian integer to 32 bytes; `None` if it does not fit.
fn to_word(bytes: &[u8]) -> Option<[u8; 32]> {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let significant = &bytes[start..];
    if significant.len() > 32 {
        return None;
    }
    let mut word = [0u8; 32];
    word[32 - significant.len()..].copy_from_slice(significant);
    Some(word)
}

fn digest_from_slice(digest: &[u8]) -> Result<Digest, CryptoError> {
    digest
        .try_into()
        .map_err(|_| CryptoError::InvalidDigestLength(digest.len()))
}

/// Signing, recovery and verification over an injected [`Curve`].
pub struct SignatureService<C = Secp256k1Curve> {
    curve: C,
}

impl SignatureService<Secp256k1Curve> {
    /// A service backed by libsecp256k1.
    pub fn secp256k1() -> Self {
        Self::new(Secp256k1Curve::new())
    }
}

impl Default for SignatureService<Secp256k1Curve> {
    fn default() -> Self {
        Self::secp256k1()
    }
}

impl<C: Curve> SignatureService<C> {
    pub fn new(curve: C) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> &C {
        &self.curve
    }

    pub fn public_key(&self, key: &PrivateKey) -> Result<PublicKey, CryptoError> {
        self.curve.public_key(key)
    }

    /// Account address controlled by `key`.
    pub fn address_of(&self, key: &PrivateKey) -> Result<Address, CryptoError> {
        Ok(account_address(&self.curve.public_key(key)?))
    }

    /// Signs a 32-byte digest.
    pub fn sign(&self, digest: &[u8], key: Option<&PrivateKey>) -> Result<Signature, CryptoError> {
        let digest = digest_from_slice(digest)?;
        let key = key.ok_or(CryptoError::MissingKey)?;
        self.curve.sign_recoverable(&digest, key)
    }

    /// Recovers the public key from a 65-byte `r || s || v` signature.
    ///
    /// This proves consistency only: some key signed `digest`, not which one
    /// the caller expected.
    pub fn recover_public_key(
        &self,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<PublicKey, CryptoError> {
        let signature = Signature::from_bytes(signature)?;
        let digest = digest_from_slice(digest)?;
        self.curve.recover(&digest, &signature)
    }

    /// Recovers the signer's account address.
    pub fn recover_address(&self, digest: &[u8], signature: &[u8]) -> Result<Address, CryptoError> {
        Ok(account_address(&self.recover_public_key(digest, signature)?))
    }

    /// Verifies a 64-byte `r || s` signature against `public_key`.
    pub fn verify_signature(&self, public_key: &PublicKey, digest: &[u8], signature: &[u8]) -> bool {
        let (Ok(digest), Ok(rs)) = (
            digest_from_slice(digest),
            <[u8; 64]>::try_from(signature),
        ) else {
            return false;
        };
        self.curve.verify(public_key, &digest, &rs)
    }

    /// Parses an uncompressed public key and checks that it is on the curve.
    pub fn parse_public_key(&self, bytes: &[u8]) -> Result<PublicKey, CryptoError> {
        let key = PublicKey::from_uncompressed(bytes)?;
        if !self.curve.is_on_curve(&key) {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(key)
    }

    /// Address of the account controlled by `public_key`.
    pub fn account_address(&self, public_key: &PublicKey) -> Address {
        account_address(public_key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::crypto::keccak256;

    const TEST_ADDR_HEX: &str = "970e8128ab834e8eac17ab8e3812f010678cf791";
    const TEST_PRIV_HEX: &str = "289c2857d4598e37fb9647507e47a309d6133539bf21a8b9cb6df88fd5232032";

    fn order_minus(k: u8) -> [u8; 32] {
        let mut out = CURVE_ORDER;
        out[31] -= k;
        out
    }

    /// n - s, used to build the high-s twin of a signature.
    fn negate_mod_order(s: &[u8; 32]) -> [u8; 32] {
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut v = CURVE_ORDER[i] as i16 - s[i] as i16 - borrow;
            borrow = if v < 0 {
                v += 256;
                1
            } else {
                0
            };
            out[i] = v as u8;
        }
        out
    }

    #[test]
    fn test_validate_signature_values() {
        let one = [1u8];
        let zero = [0u8];
        let n = CURVE_ORDER;
        let n_minus_1 = order_minus(1);

        assert!(validate_signature_values(0, &one, &one, false));
        assert!(validate_signature_values(1, &one, &one, false));
        assert!(!validate_signature_values(2, &one, &one, false));
        assert!(!validate_signature_values(3, &one, &one, false));

        for v in [0, 1, 2] {
            assert!(!validate_signature_values(v, &zero, &zero, false));
            assert!(!validate_signature_values(v, &zero, &one, false));
            assert!(!validate_signature_values(v, &one, &zero, false));
        }

        assert!(validate_signature_values(0, &n_minus_1, &n_minus_1, false));
        assert!(!validate_signature_values(0, &n, &n_minus_1, false));
        assert!(!validate_signature_values(0, &n_minus_1, &n, false));
        assert!(!validate_signature_values(0, &n, &n, false));
        // 33 significant bytes
        assert!(!validate_signature_values(0, &[1u8; 33], &one, false));
        assert!(!validate_signature_values(0, &[], &one, false));
    }

    #[test]
    fn test_validate_low_s_rule() {
        let one = [1u8];
        let mut above_half = HALF_CURVE_ORDER;
        above_half[31] += 1;
        assert!(validate_signature_values(0, &one, &HALF_CURVE_ORDER, true));
        assert!(!validate_signature_values(0, &one, &above_half, true));
        assert!(validate_signature_values(0, &one, &above_half, false));
        assert!(!validate_signature_values(0, &one, &order_minus(1), true));
    }

    #[test]
    fn test_sign_and_recover() {
        let service = SignatureService::secp256k1();
        let key = PrivateKey::from_hex(TEST_PRIV_HEX).unwrap();
        let expected = Address::from_hex(TEST_ADDR_HEX).unwrap();
        assert_eq!(service.address_of(&key).unwrap(), expected);

        let digest = keccak256(b"foo");
        let signature = service.sign(&digest, Some(&key)).unwrap();
        assert!(signature.is_valid(true));

        let recovered = service
            .recover_public_key(&digest, &signature.to_bytes())
            .unwrap();
        assert_eq!(recovered, service.public_key(&key).unwrap());
        assert_eq!(service.account_address(&recovered), expected);
        assert_eq!(
            service.recover_address(&digest, &signature.to_bytes()).unwrap(),
            expected
        );
    }

    #[test]
    fn test_sign_round_trip_random_keys() {
        let service = SignatureService::secp256k1();
        for i in 0..8u8 {
            let key = PrivateKey::generate().unwrap();
            let digest = keccak256(&[i]);
            let signature = service.sign(&digest, Some(&key)).unwrap();
            assert_eq!(
                service.recover_address(&digest, &signature.to_bytes()).unwrap(),
                service.address_of(&key).unwrap()
            );
        }
    }

    #[test]
    fn test_invalid_sign() {
        let service = SignatureService::secp256k1();
        let key = PrivateKey::from_hex(TEST_PRIV_HEX).unwrap();
        assert!(matches!(
            service.sign(&[0u8; 1], Some(&key)),
            Err(CryptoError::InvalidDigestLength(1))
        ));
        assert!(matches!(
            service.sign(&[0u8; 33], Some(&key)),
            Err(CryptoError::InvalidDigestLength(33))
        ));
        assert!(matches!(
            service.sign(&[0u8; 32], None),
            Err(CryptoError::MissingKey)
        ));
    }

    #[test]
    fn test_recover_rejects_bad_shape() {
        let service = SignatureService::secp256k1();
        let digest = keccak256(b"foo");
        assert!(matches!(
            service.recover_public_key(&digest, &[0u8; 64]),
            Err(CryptoError::InvalidSignatureShape(_))
        ));
        let mut sig = [1u8; 65];
        sig[64] = 27;
        assert!(matches!(
            service.recover_public_key(&digest, &sig),
            Err(CryptoError::InvalidSignatureShape(_))
        ));
    }

    #[test]
    fn test_verify_signature() {
        let service = SignatureService::secp256k1();
        let key = PrivateKey::from_hex(TEST_PRIV_HEX).unwrap();
        let public = service.public_key(&key).unwrap();
        let digest = keccak256(b"foo");
        let signature = service.sign(&digest, Some(&key)).unwrap();

        assert!(service.verify_signature(&public, &digest, &signature.rs()));
        assert!(!service.verify_signature(&public, &keccak256(b"bar"), &signature.rs()));
        // the full 65-byte form is not accepted by plain verification
        assert!(!service.verify_signature(&public, &digest, &signature.to_bytes()));

        let high_s = Signature::new(*signature.r(), negate_mod_order(signature.s()), 0);
        assert!(!high_s.is_valid(true));
        assert!(high_s.is_valid(false));
        assert!(!service.verify_signature(&public, &digest, &high_s.rs()));
    }

    #[test]
    fn test_parse_public_key() {
        let service = SignatureService::secp256k1();
        let enc = hex::decode(
            "04760c4460e5336ac9bbd87952a3c7ec4363fc0a97bd31c86430806e287b437fd1\
             b01abc6e1db640cf3106b520344af1d58b00b57823db3e1407cbc433e1b6d04d",
        )
        .unwrap();
        let key = service.parse_public_key(&enc).unwrap();
        assert_eq!(
            hex::encode(key.x()),
            "760c4460e5336ac9bbd87952a3c7ec4363fc0a97bd31c86430806e287b437fd1"
        );
        assert_eq!(
            hex::encode(key.y()),
            "b01abc6e1db640cf3106b520344af1d58b00b57823db3e1407cbc433e1b6d04d"
        );
        assert_eq!(key.to_uncompressed().to_vec(), enc);

        assert!(service.parse_public_key(&[]).is_err());
        assert!(service.parse_public_key(&[1, 2, 3]).is_err());
        let mut off_curve = enc.clone();
        off_curve[64] ^= 1;
        assert!(matches!(
            service.parse_public_key(&off_curve),
            Err(CryptoError::InvalidPublicKey)
        ));
    }

    #[test]
    fn test_external_vrs() {
        let sig = Signature::from_external_vrs(28, &[0x01, 0x02], &[0x03]).unwrap();
        assert_eq!(sig.v(), 1);
        assert_eq!(&sig.r()[30..], &[0x01, 0x02]);
        assert_eq!(sig.s()[31], 0x03);
        assert!(Signature::from_external_vrs(29, &[1], &[1]).is_err());
        assert!(Signature::from_external_vrs(0, &[1u8; 33], &[1]).is_err());
    }

    /// A stand-in curve: the "public key" is the key hashed twice, and the
    /// signature carries the key in `s`. Counts every call.
    #[derive(Default)]
    struct FakeCurve {
        calls: AtomicUsize,
    }

    impl FakeCurve {
        fn point_for(secret: &[u8; 32]) -> PublicKey {
            let mut xy = [0u8; 64];
            xy[..32].copy_from_slice(&keccak256(secret));
            let second = keccak256(&xy[..32]);
            xy[32..].copy_from_slice(&second);
            PublicKey::from_xy(xy)
        }
    }

    impl Curve for FakeCurve {
        fn public_key(&self, key: &PrivateKey) -> Result<PublicKey, CryptoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::point_for(&key.to_bytes()))
        }

        fn sign_recoverable(
            &self,
            digest: &Digest,
            key: &PrivateKey,
        ) -> Result<Signature, CryptoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Signature::new(*digest, key.to_bytes(), 1))
        }

        fn recover(&self, digest: &Digest, signature: &Signature) -> Result<PublicKey, CryptoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(signature.r(), digest);
            Ok(Self::point_for(signature.s()))
        }

        fn verify(&self, public_key: &PublicKey, _digest: &Digest, rs: &[u8; 64]) -> bool {
            let mut s = [0u8; 32];
            s.copy_from_slice(&rs[32..]);
            Self::point_for(&s) == *public_key
        }

        fn is_on_curve(&self, _public_key: &PublicKey) -> bool {
            true
        }
    }

    #[test]
    fn test_service_with_fake_curve() {
        let service = SignatureService::new(FakeCurve::default());
        let key = PrivateKey::from_u64(42).unwrap();
        let digest = keccak256(b"payload");

        let signature = service.sign(&digest, Some(&key)).unwrap();
        assert_eq!(
            service.recover_address(&digest, &signature.to_bytes()).unwrap(),
            service.address_of(&key).unwrap()
        );
        assert!(service.verify_signature(
            &service.public_key(&key).unwrap(),
            &digest,
            &signature.rs()
        ));
    }

    #[test]
    fn test_shape_errors_never_reach_curve() {
        let service = SignatureService::new(FakeCurve::default());
        let key = PrivateKey::from_u64(7).unwrap();
        let _ = service.sign(&[0u8; 31], Some(&key));
        let _ = service.recover_public_key(&[0u8; 32], &[0u8; 66]);
        let mut bad_v = [1u8; 65];
        bad_v[64] = 2;
        let _ = service.recover_public_key(&[0u8; 32], &bad_v);
        assert_eq!(service.curve().calls.load(Ordering::SeqCst), 0);
    }
}
