//! # Hashing Utilities
//!
//! The ledger uses exactly three hash constructions, and refuses to grow
//! a fourth:
//!
//! - **SHA-512Half**: the first 256 bits of SHA-512. Used for key
//!   derivation, secp256k1 signing digests and transaction IDs. Faster than
//!   SHA-256 on 64-bit hardware and immune to length extension once
//!   truncated.
//!
//! - **SHA-256**: only as the inner half of [`hash160`], and inside the
//!   base58check checksum (which `bs58` computes for us).
//!
//! - **RIPEMD-160(SHA-256(x))**: account identifiers. Inherited from
//!   Bitcoin's address scheme; 20 bytes is plenty for an address.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

/// Compute the SHA-256 hash of the input data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute SHA-512Half: the first 32 bytes of `SHA-512(data)`.
///
/// # Example
///
/// ```
/// use ripple_codec::crypto::hash::sha512_half;
///
/// let digest = sha512_half(b"masterpassphrase");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha512_half(data: &[u8]) -> [u8; 32] {
    sha512_half_multi(&[data])
}

/// SHA-512Half over several byte slices fed sequentially into one hasher.
///
/// Same result as concatenating the parts first, without the temporary
/// buffer. Key derivation hashes `seed || counter` this way, and signing
/// hashes `prefix || body`.
pub fn sha512_half_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result[..32]);
    output
}

/// Compute `RIPEMD-160(SHA-256(data))`, the account-identifier hash.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(sha256(data));
    let result = hasher.finalize();
    let mut output = [0u8; 20];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha512_half_is_prefix_of_sha512() {
        // SHA-512("abc") starts with ddaf35a193617aba...
        let digest = sha512_half(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a"
        );
    }

    #[test]
    fn multi_part_matches_concatenation() {
        let joined = sha512_half(b"helloworld");
        let parts = sha512_half_multi(&[b"hello", b"world"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn hash160_known_vector() {
        // RIPEMD-160(SHA-256("")), the classic empty-input Bitcoin hash160.
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    #[test]
    fn hashes_are_deterministic() {
        assert_eq!(sha512_half(b"ledger"), sha512_half(b"ledger"));
        assert_ne!(sha512_half(b"ledger"), sha512_half(b"ledgers"));
    }
}
