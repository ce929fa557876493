//! # Digital Signatures
//!
//! Digest selection, signing and verification for both ledger algorithms.
//!
//! The two algorithms disagree on what they sign:
//!
//! - **secp256k1** signs a 32-byte digest, `SHA-512Half(message)`, with an
//!   RFC 6979 deterministic nonce. Output is DER with a low S value;
//!   high-S signatures are rejected on verification because they are
//!   malleable.
//! - **Ed25519** signs the message itself and does its own SHA-512
//!   internally. Output is the raw 64-byte signature.
//!
//! [`SigningDigest`] makes that difference a type, so a digest prepared for
//! one algorithm cannot be fed to a key of the other.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, VerifyingKey};
use secp256k1::ecdsa::Signature as EcdsaSignature;
use secp256k1::{Message, PublicKey as SecpPublicKey, SecretKey};
use std::fmt;
use thiserror::Error;

use super::hash::sha512_half;
use super::keys::{Algorithm, KeyPair, PublicKey};
use super::secp_context;

/// Errors during signature operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The digest was prepared for a different algorithm than the key's.
    #[error("digest prepared for {digest} cannot be signed with a {key} key")]
    AlgorithmMismatch { digest: Algorithm, key: Algorithm },

    /// The stored secret could not be loaded by the curve library.
    #[error("invalid signing key")]
    InvalidKey,
}

/// What actually gets signed, per algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningDigest {
    /// `SHA-512Half(message)`, for secp256k1.
    Secp256k1([u8; 32]),
    /// The message itself, for Ed25519.
    Ed25519(Vec<u8>),
}

impl SigningDigest {
    /// Prepare `message` for signing with `algorithm`.
    pub fn new(message: &[u8], algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Secp256k1 => Self::Secp256k1(sha512_half(message)),
            Algorithm::Ed25519 => Self::Ed25519(message.to_vec()),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Secp256k1(_) => Algorithm::Secp256k1,
            Self::Ed25519(_) => Algorithm::Ed25519,
        }
    }
}

/// A signature as it appears in `TxnSignature`: DER for secp256k1, 64 raw
/// bytes for Ed25519.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Uppercase hex, as the ledger's JSON carries it.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self { bytes: hex::decode(s)? })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() > 24 {
            write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[hex_str.len() - 8..])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}

/// Sign a prepared digest.
///
/// # Errors
///
/// [`SignatureError::AlgorithmMismatch`] when `digest` was prepared for the
/// other algorithm.
pub fn sign_digest(digest: &SigningDigest, keypair: &KeyPair) -> Result<Signature, SignatureError> {
    match (digest, keypair.algorithm()) {
        (SigningDigest::Secp256k1(hash), Algorithm::Secp256k1) => {
            let mut secret_key =
                SecretKey::from_slice(keypair.secret_bytes()).map_err(|_| SignatureError::InvalidKey)?;
            let message = Message::from_digest(*hash);
            let signature = secp_context().sign_ecdsa(&message, &secret_key);
            secret_key.non_secure_erase();
            Ok(Signature::from_bytes(signature.serialize_der().to_vec()))
        }
        (SigningDigest::Ed25519(message), Algorithm::Ed25519) => {
            // Dropped (and zeroized) at the end of this arm.
            let signing_key = SigningKey::from_bytes(keypair.secret_bytes());
            let signature = signing_key.sign(message);
            Ok(Signature::from_bytes(signature.to_bytes().to_vec()))
        }
        (digest, key) => Err(SignatureError::AlgorithmMismatch {
            digest: digest.algorithm(),
            key,
        }),
    }
}

/// Verify a signature over a prepared digest.
///
/// Returns `false` for any failure: wrong key, wrong algorithm, malformed
/// signature bytes, non-canonical DER, high-S. Callers only ever need the
/// yes/no.
pub fn verify_digest(digest: &SigningDigest, signature: &Signature, public_key: &PublicKey) -> bool {
    if digest.algorithm() != public_key.algorithm() {
        return false;
    }
    match digest {
        SigningDigest::Secp256k1(hash) => {
            let Ok(key) = SecpPublicKey::from_slice(public_key.as_bytes()) else {
                return false;
            };
            let Ok(sig) = EcdsaSignature::from_der(signature.as_bytes()) else {
                return false;
            };
            let message = Message::from_digest(*hash);
            secp_context().verify_ecdsa(&message, &sig, &key).is_ok()
        }
        SigningDigest::Ed25519(message) => {
            let mut point = [0u8; 32];
            point.copy_from_slice(&public_key.as_bytes()[1..]);
            let Ok(key) = VerifyingKey::from_bytes(&point) else {
                return false;
            };
            let Ok(sig_bytes) = <[u8; 64]>::try_from(signature.as_bytes()) else {
                return false;
            };
            key.verify_strict(message, &DalekSignature::from_bytes(&sig_bytes)).is_ok()
        }
    }
}

/// Hash-or-not `message` for the key's algorithm, then sign it.
pub fn sign_message(keypair: &KeyPair, message: &[u8]) -> Result<Signature, SignatureError> {
    sign_digest(&SigningDigest::new(message, keypair.algorithm()), keypair)
}

/// Counterpart of [`sign_message`].
pub fn verify_message(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    verify_digest(&SigningDigest::new(message, public_key.algorithm()), signature, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::derive_keypair;

    fn keypair(algorithm: Algorithm) -> KeyPair {
        derive_keypair(&[0x5A; 16], algorithm).unwrap()
    }

    #[test]
    fn sign_verify_roundtrip_both_algorithms() {
        for algorithm in [Algorithm::Secp256k1, Algorithm::Ed25519] {
            let kp = keypair(algorithm);
            let sig = sign_message(&kp, b"pay 10 drops").unwrap();
            assert!(verify_message(kp.public_key(), b"pay 10 drops", &sig));
            assert!(!verify_message(kp.public_key(), b"pay 11 drops", &sig));
        }
    }

    #[test]
    fn signatures_are_deterministic() {
        for algorithm in [Algorithm::Secp256k1, Algorithm::Ed25519] {
            let kp = keypair(algorithm);
            let a = sign_message(&kp, b"same message").unwrap();
            let b = sign_message(&kp, b"same message").unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn ed25519_signature_is_64_raw_bytes() {
        let sig = sign_message(&keypair(Algorithm::Ed25519), b"x").unwrap();
        assert_eq!(sig.as_bytes().len(), 64);
    }

    #[test]
    fn secp256k1_signature_is_der() {
        let sig = sign_message(&keypair(Algorithm::Secp256k1), b"x").unwrap();
        let bytes = sig.as_bytes();
        assert_eq!(bytes[0], 0x30, "DER sequence tag");
        assert_eq!(bytes[1] as usize, bytes.len() - 2);
        assert!(bytes.len() <= 72);
    }

    #[test]
    fn mismatched_digest_is_rejected() {
        let ed = keypair(Algorithm::Ed25519);
        let digest = SigningDigest::new(b"msg", Algorithm::Secp256k1);
        assert_eq!(
            sign_digest(&digest, &ed),
            Err(SignatureError::AlgorithmMismatch {
                digest: Algorithm::Secp256k1,
                key: Algorithm::Ed25519,
            })
        );
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = derive_keypair(&[1u8; 16], Algorithm::Secp256k1).unwrap();
        let kp2 = derive_keypair(&[2u8; 16], Algorithm::Secp256k1).unwrap();
        let sig = sign_message(&kp1, b"message").unwrap();
        assert!(!verify_message(kp2.public_key(), b"message", &sig));
    }

    #[test]
    fn cross_algorithm_verification_is_false() {
        let ed = keypair(Algorithm::Ed25519);
        let secp = keypair(Algorithm::Secp256k1);
        let sig = sign_message(&ed, b"message").unwrap();
        assert!(!verify_message(secp.public_key(), b"message", &sig));
    }

    #[test]
    fn garbage_signature_bytes_fail_cleanly() {
        let kp = keypair(Algorithm::Secp256k1);
        assert!(!verify_message(kp.public_key(), b"m", &Signature::from_bytes(vec![0x30, 0x01])));
        let kp = keypair(Algorithm::Ed25519);
        assert!(!verify_message(kp.public_key(), b"m", &Signature::from_bytes(vec![0u8; 10])));
    }

    #[test]
    fn signature_hex_round_trip() {
        let sig = sign_message(&keypair(Algorithm::Ed25519), b"hex").unwrap();
        let recovered = Signature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(sig, recovered);
    }
}
