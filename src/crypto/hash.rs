//! Keccak-256 hashing (pre-standard Keccak padding, not FIPS-202 SHA3-256).

use tiny_keccak::{Hasher, Keccak};

/// A 32-byte Keccak-256 output.
pub type Digest = [u8; 32];

/// Keccak-256 of arbitrary bytes.
#[inline]
pub fn keccak256(input: &[u8]) -> Digest {
    let mut hasher = Keccak::v256();
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Keccak-256 over the concatenation of `parts`.
#[inline]
pub fn keccak256_concat(parts: &[&[u8]]) -> Digest {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// A reusable streaming Keccak-256 state.
///
/// `sum` finalizes a copy of the absorb state, so more data can be written
/// afterwards and summed again. Call `reset` to start a new message.
#[derive(Clone)]
pub struct KeccakState {
    inner: Keccak,
}

impl KeccakState {
    pub fn new() -> Self {
        Self {
            inner: Keccak::v256(),
        }
    }

    /// Absorbs more input.
    pub fn write(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Returns the digest of everything written since the last reset.
    pub fn sum(&self) -> Digest {
        let mut out = [0u8; 32];
        self.inner.clone().finalize(&mut out);
        out
    }

    /// Clears the absorb state.
    pub fn reset(&mut self) {
        self.inner = Keccak::v256();
    }
}

impl Default for KeccakState {
    fn default() -> Self {
        Self::new()
    }
}

/// Hashes `data` with a reused state, resetting it first.
pub fn hash_data(state: &mut KeccakState, data: &[u8]) -> Digest {
    state.reset();
    state.write(data);
    state.sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC_DIGEST: &str = "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45";

    #[test]
    fn test_keccak256_vector() {
        assert_eq!(hex::encode(keccak256(b"abc")), ABC_DIGEST);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_reused_state() {
        let mut state = KeccakState::new();
        assert_eq!(hex::encode(hash_data(&mut state, b"abc")), ABC_DIGEST);
        // a second message through the same state must not see the first
        assert_eq!(hex::encode(hash_data(&mut state, b"abc")), ABC_DIGEST);
    }

    #[test]
    fn test_sum_does_not_consume_state() {
        let mut state = KeccakState::new();
        state.write(b"ab");
        let partial = state.sum();
        state.write(b"c");
        assert_eq!(partial, keccak256(b"ab"));
        assert_eq!(state.sum(), keccak256(b"abc"));
    }

    #[test]
    fn test_concat_matches_single_buffer() {
        assert_eq!(keccak256_concat(&[b"a", b"", b"bc"]), keccak256(b"abc"));
    }
}
