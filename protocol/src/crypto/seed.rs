//! Seeds: 16 bytes of entropy plus an algorithm hint.
//!
//! The human form is base58check in the ledger alphabet. The version prefix
//! doubles as the algorithm hint: a single `0x21` byte for secp256k1
//! (`s…`), the three bytes `01 E1 4B` for Ed25519 (`sEd…`).

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::hash::sha512_half;
use super::keys::{Algorithm, KeyError};
use crate::address::base58;
use crate::config::{ED25519_SEED_VERSION, SECP256K1_SEED_VERSION, SEED_LENGTH};

/// Seed entropy with its algorithm hint. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    #[zeroize(skip)]
    algorithm: Algorithm,
    entropy: [u8; SEED_LENGTH],
}

impl Seed {
    /// Wrap raw entropy. Fails unless `entropy` is exactly 16 bytes.
    pub fn from_entropy(entropy: &[u8], algorithm: Algorithm) -> Result<Self, KeyError> {
        let entropy: [u8; SEED_LENGTH] =
            entropy.try_into().map_err(|_| KeyError::InvalidSeed {
                reason: format!("expected {} bytes of entropy, got {}", SEED_LENGTH, entropy.len()),
            })?;
        Ok(Self { algorithm, entropy })
    }

    /// Fresh entropy from the OS RNG.
    pub fn generate(algorithm: Algorithm) -> Self {
        let mut entropy = [0u8; SEED_LENGTH];
        OsRng.fill_bytes(&mut entropy);
        Self { algorithm, entropy }
    }

    /// Derive a seed from a passphrase: the first 16 bytes of
    /// `SHA-512Half(passphrase)`.
    ///
    /// This is how the genesis account's `"masterpassphrase"` seed was made.
    /// Human-chosen passphrases are brute-forceable; keep this for tests and
    /// well-known fixtures.
    pub fn from_passphrase(passphrase: &str, algorithm: Algorithm) -> Self {
        let mut digest = sha512_half(passphrase.as_bytes());
        let mut entropy = [0u8; SEED_LENGTH];
        entropy.copy_from_slice(&digest[..SEED_LENGTH]);
        digest.zeroize();
        Self { algorithm, entropy }
    }

    /// Parse the base58 form. The version prefix decides the algorithm.
    pub fn from_base58(s: &str) -> Result<Self, KeyError> {
        let mut payload = base58::decode_checked(s).map_err(|e| KeyError::InvalidSeed {
            reason: e.to_string(),
        })?;

        let parsed = if payload.len() == ED25519_SEED_VERSION.len() + SEED_LENGTH
            && payload.starts_with(&ED25519_SEED_VERSION)
        {
            Self::from_entropy(&payload[ED25519_SEED_VERSION.len()..], Algorithm::Ed25519)
        } else if payload.len() == SECP256K1_SEED_VERSION.len() + SEED_LENGTH
            && payload.starts_with(&SECP256K1_SEED_VERSION)
        {
            Self::from_entropy(&payload[SECP256K1_SEED_VERSION.len()..], Algorithm::Secp256k1)
        } else {
            Err(KeyError::InvalidSeed {
                reason: format!("unrecognized seed prefix or length ({} bytes)", payload.len()),
            })
        };
        payload.zeroize();
        parsed
    }

    /// Encode as base58 with the version prefix for this seed's algorithm.
    pub fn to_base58(&self) -> String {
        let version: &[u8] = match self.algorithm {
            Algorithm::Ed25519 => &ED25519_SEED_VERSION,
            Algorithm::Secp256k1 => &SECP256K1_SEED_VERSION,
        };
        base58::encode_versioned(version, &self.entropy)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn entropy(&self) -> &[u8; SEED_LENGTH] {
        &self.entropy
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({}, <redacted>)", self.algorithm)
    }
}
