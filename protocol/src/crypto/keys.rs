//! # Key Derivation
//!
//! Deterministic keypair derivation from a 16-byte seed, for both signature
//! algorithms the ledger accepts.
//!
//! ## Ed25519
//!
//! ```text
//! secret = SHA-512Half(seed)
//! public = 0xED || Ed25519PublicKey(secret)
//! ```
//!
//! ## secp256k1 (legacy family-generator scheme)
//!
//! ```text
//! root         = first valid SHA-512Half(seed || seq)              seq = 0, 1, ...
//! root_public  = compress(root * G)
//! intermediate = first valid SHA-512Half(root_public || index || seq)
//! secret       = (root + intermediate) mod n
//! public       = compress(secret * G)
//! ```
//!
//! A candidate is valid when it lies in `[1, n)`. Each search is bounded by
//! [`KEY_DERIVATION_MAX_ATTEMPTS`].
//!
//! ## Security considerations
//!
//! - Secret scalars live in `Zeroizing` buffers and are wiped on drop.
//!   Temporary candidates are wiped as soon as they are rejected or copied.
//! - `KeyPair` does not implement `Clone`, `Serialize` or a `Debug` that
//!   shows secret bytes.
//! - Key bytes are never logged. Public keys and account ids are fair game.

use ed25519_dalek::{SigningKey, VerifyingKey};
use secp256k1::{PublicKey as SecpPublicKey, Scalar, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use super::hash::sha512_half_multi;
use super::seed::Seed;
use super::secp_context;
use crate::address::base58;
use crate::address::AccountId;
use crate::config::{
    ACCOUNT_PUBLIC_KEY_VERSION, DEFAULT_ACCOUNT_INDEX, ED25519_KEY_PREFIX,
    KEY_DERIVATION_MAX_ATTEMPTS, PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH, SEED_LENGTH,
};

/// Errors that can occur during key operations.
///
/// Messages describe *what* was wrong with the input, never the key bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid seed: {reason}")]
    InvalidSeed { reason: String },

    #[error("key derivation found no valid scalar in {attempts} attempts")]
    KeyDerivationExhausted { attempts: u32 },

    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("invalid private key bytes")]
    InvalidPrivateKey,

    #[error("unknown signature algorithm: {0}")]
    UnknownAlgorithm(String),
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// Signature algorithm selector. Chosen once at keypair creation; every
/// downstream operation matches on it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Secp256k1,
    Ed25519,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secp256k1 => write!(f, "secp256k1"),
            Self::Ed25519 => write!(f, "ed25519"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "secp256k1" => Ok(Self::Secp256k1),
            "ed25519" => Ok(Self::Ed25519),
            other => Err(KeyError::UnknownAlgorithm(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A 33-byte public key as it appears in `SigningPubKey`.
///
/// The first byte identifies the algorithm: `0xED` for Ed25519, `0x02`/`0x03`
/// for a compressed secp256k1 point.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl PublicKey {
    /// Parse and validate public key bytes.
    ///
    /// The point itself is checked, not just the prefix. An off-curve key
    /// would make every signature "invalid" for a confusing reason.
    pub fn from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        match bytes[0] {
            ED25519_KEY_PREFIX => {
                let mut point = [0u8; 32];
                point.copy_from_slice(&bytes[1..]);
                VerifyingKey::from_bytes(&point).map_err(|_| KeyError::InvalidPublicKey)?;
            }
            0x02 | 0x03 => {
                SecpPublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
            }
            _ => return Err(KeyError::InvalidPublicKey),
        }
        Ok(Self { bytes })
    }

    /// Parse a hex-encoded public key (either case).
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_slice(&bytes)
    }

    /// Which algorithm this key belongs to.
    pub fn algorithm(&self) -> Algorithm {
        if self.bytes[0] == ED25519_KEY_PREFIX {
            Algorithm::Ed25519
        } else {
            Algorithm::Secp256k1
        }
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Uppercase hex, the form used in JSON transactions.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.bytes)
    }

    /// The `a…` base58 form of an account public key.
    pub fn to_base58(&self) -> String {
        base58::encode_versioned(&[ACCOUNT_PUBLIC_KEY_VERSION], &self.bytes)
    }

    /// The account this key controls as its master key.
    pub fn account_id(&self) -> AccountId {
        AccountId::from_public_key(&self.bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.algorithm(), &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// A derived signing keypair.
///
/// The secret scalar is only reachable from inside the crate, by the signer,
/// for the duration of a single signing call.
pub struct KeyPair {
    algorithm: Algorithm,
    public_key: PublicKey,
    secret: Zeroizing<[u8; PRIVATE_KEY_LENGTH]>,
}

impl KeyPair {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Account id controlled by this keypair's public key.
    pub fn account_id(&self) -> AccountId {
        self.public_key.account_id()
    }

    pub(crate) fn secret_bytes(&self) -> &[u8; PRIVATE_KEY_LENGTH] {
        &self.secret
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the public half. Always.
        write!(f, "KeyPair({}, pub={})", self.algorithm, self.public_key.to_hex())
    }
}

impl PartialEq for KeyPair {
    /// Compared by public key, so secret bytes never go through a
    /// non-constant-time comparison.
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.public_key == other.public_key
    }
}

impl Eq for KeyPair {}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive the account keypair for raw seed entropy.
///
/// # Errors
///
/// [`KeyError::InvalidSeed`] if `seed` is not exactly 16 bytes, and
/// [`KeyError::KeyDerivationExhausted`] if the secp256k1 scalar search runs
/// out of attempts.
///
/// # Example
///
/// ```
/// use ripple_codec::crypto::keys::{derive_keypair, Algorithm};
///
/// let seed = [7u8; 16];
/// let a = derive_keypair(&seed, Algorithm::Ed25519).unwrap();
/// let b = derive_keypair(&seed, Algorithm::Ed25519).unwrap();
/// assert_eq!(a.public_key(), b.public_key());
/// ```
pub fn derive_keypair(seed: &[u8], algorithm: Algorithm) -> Result<KeyPair, KeyError> {
    derive_keypair_with_index(seed, algorithm, DEFAULT_ACCOUNT_INDEX)
}

/// Derive the account keypair for a decoded [`Seed`], honoring its
/// algorithm hint.
pub fn derive_keypair_from_seed(seed: &Seed) -> Result<KeyPair, KeyError> {
    derive_keypair(seed.entropy(), seed.algorithm())
}

/// Derive with an explicit secp256k1 account index.
///
/// Ed25519 has no intermediate key, so `account_index` only affects
/// secp256k1.
pub fn derive_keypair_with_index(
    seed: &[u8],
    algorithm: Algorithm,
    account_index: u32,
) -> Result<KeyPair, KeyError> {
    if seed.len() != SEED_LENGTH {
        return Err(KeyError::InvalidSeed {
            reason: format!("expected {} bytes of entropy, got {}", SEED_LENGTH, seed.len()),
        });
    }

    let keypair = match algorithm {
        Algorithm::Ed25519 => derive_ed25519(seed),
        Algorithm::Secp256k1 => derive_secp256k1(seed, account_index)?,
    };

    tracing::debug!(
        algorithm = %algorithm,
        account = %keypair.account_id(),
        "derived keypair"
    );
    Ok(keypair)
}

fn derive_ed25519(seed: &[u8]) -> KeyPair {
    let secret = Zeroizing::new(sha512_half_multi(&[seed]));
    // SigningKey zeroizes itself on drop.
    let signing_key = SigningKey::from_bytes(&secret);

    let mut public = [0u8; PUBLIC_KEY_LENGTH];
    public[0] = ED25519_KEY_PREFIX;
    public[1..].copy_from_slice(signing_key.verifying_key().as_bytes());

    KeyPair {
        algorithm: Algorithm::Ed25519,
        public_key: PublicKey { bytes: public },
        secret,
    }
}

fn derive_secp256k1(seed: &[u8], account_index: u32) -> Result<KeyPair, KeyError> {
    let mut root = derive_scalar(seed, None)?;
    let root_public = SecpPublicKey::from_secret_key(secp_context(), &root).serialize();

    let mut intermediate = derive_scalar(&root_public, Some(account_index))?;
    let tweak = Scalar::from(intermediate);
    intermediate.non_secure_erase();

    let derived = root.add_tweak(&tweak).map_err(|_| KeyError::InvalidPrivateKey);
    root.non_secure_erase();
    let mut secret_key = derived?;

    let public = SecpPublicKey::from_secret_key(secp_context(), &secret_key).serialize();
    let secret = Zeroizing::new(secret_key.secret_bytes());
    secret_key.non_secure_erase();

    Ok(KeyPair {
        algorithm: Algorithm::Secp256k1,
        public_key: PublicKey { bytes: public },
        secret,
    })
}

/// Search `SHA-512Half(bytes [|| discriminator] || seq)` for the first
/// candidate that is a valid secp256k1 secret (`0 < k < n`).
fn derive_scalar(bytes: &[u8], discriminator: Option<u32>) -> Result<SecretKey, KeyError> {
    for seq in 0..KEY_DERIVATION_MAX_ATTEMPTS {
        let seq_bytes = seq.to_be_bytes();
        let mut candidate = match discriminator {
            Some(index) => sha512_half_multi(&[bytes, &index.to_be_bytes(), &seq_bytes]),
            None => sha512_half_multi(&[bytes, &seq_bytes]),
        };
        let parsed = SecretKey::from_slice(&candidate);
        candidate.zeroize();
        if let Ok(key) = parsed {
            return Ok(key);
        }
        tracing::trace!(seq, "secp256k1 candidate out of range, retrying");
    }
    Err(KeyError::KeyDerivationExhausted {
        attempts: KEY_DERIVATION_MAX_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_derivation_is_deterministic() {
        let seed = [42u8; 16];
        let kp1 = derive_keypair(&seed, Algorithm::Ed25519).unwrap();
        let kp2 = derive_keypair(&seed, Algorithm::Ed25519).unwrap();
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.secret_bytes(), kp2.secret_bytes());
        assert_eq!(kp1.public_key().as_bytes()[0], ED25519_KEY_PREFIX);
    }

    #[test]
    fn secp256k1_derivation_is_deterministic() {
        let seed = [42u8; 16];
        let kp1 = derive_keypair(&seed, Algorithm::Secp256k1).unwrap();
        let kp2 = derive_keypair(&seed, Algorithm::Secp256k1).unwrap();
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.secret_bytes(), kp2.secret_bytes());
        assert!(matches!(kp1.public_key().as_bytes()[0], 0x02 | 0x03));
    }

    #[test]
    fn algorithms_produce_different_keys() {
        let seed = [1u8; 16];
        let ed = derive_keypair(&seed, Algorithm::Ed25519).unwrap();
        let secp = derive_keypair(&seed, Algorithm::Secp256k1).unwrap();
        assert_ne!(ed.public_key(), secp.public_key());
        assert_ne!(ed.account_id(), secp.account_id());
    }

    #[test]
    fn account_index_changes_secp256k1_key() {
        let seed = [3u8; 16];
        let first = derive_keypair_with_index(&seed, Algorithm::Secp256k1, 0).unwrap();
        let second = derive_keypair_with_index(&seed, Algorithm::Secp256k1, 1).unwrap();
        assert_ne!(first.public_key(), second.public_key());
    }

    #[test]
    fn wrong_seed_length_is_invalid_seed() {
        let err = derive_keypair(&[0u8; 15], Algorithm::Ed25519).unwrap_err();
        assert!(matches!(err, KeyError::InvalidSeed { .. }));
        let err = derive_keypair(&[0u8; 32], Algorithm::Secp256k1).unwrap_err();
        assert!(matches!(err, KeyError::InvalidSeed { .. }));
    }

    #[test]
    fn genesis_account_vector() {
        // The genesis account: passphrase "masterpassphrase".
        let seed = Seed::from_base58("snoPBrXtMeMyMHUVTgbuqAfg1SUTb").unwrap();
        let kp = derive_keypair_from_seed(&seed).unwrap();
        assert_eq!(kp.algorithm(), Algorithm::Secp256k1);
        assert_eq!(
            kp.public_key().to_hex(),
            "0330E7FC9D56BB25D6893BA3F317AE5BCF33B3291BD63DB32654A313222F7FD020"
        );
        assert_eq!(kp.account_id().to_address(), "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh");
    }

    #[test]
    fn ed25519_seed_vector() {
        let seed = Seed::from_base58("sEdSKaCy2JT7JaM7v95H9SxkhP9wS2r").unwrap();
        let kp = derive_keypair_from_seed(&seed).unwrap();
        assert_eq!(kp.algorithm(), Algorithm::Ed25519);
        assert_eq!(
            kp.public_key().to_hex(),
            "ED01FA53FA5A7E77798F882ECE20B1ABC00BB358A9E55A202D0D0676BD0CE37A63"
        );
        assert_eq!(kp.account_id().to_address(), "rLUEXYuLiQptky37CqLcm9USQpPiz5rkpD");
    }

    #[test]
    fn public_key_validation() {
        let kp = derive_keypair(&[5u8; 16], Algorithm::Secp256k1).unwrap();
        let parsed = PublicKey::from_slice(kp.public_key().as_bytes()).unwrap();
        assert_eq!(&parsed, kp.public_key());
        assert_eq!(parsed.algorithm(), Algorithm::Secp256k1);

        // Wrong prefix byte.
        let mut bad = *kp.public_key().as_bytes();
        bad[0] = 0x05;
        assert_eq!(PublicKey::from_slice(&bad), Err(KeyError::InvalidPublicKey));

        // Wrong length.
        assert_eq!(PublicKey::from_slice(&bad[..32]), Err(KeyError::InvalidPublicKey));
    }

    #[test]
    fn public_key_hex_round_trip() {
        let kp = derive_keypair(&[9u8; 16], Algorithm::Ed25519).unwrap();
        let hex_str = kp.public_key().to_hex();
        assert_eq!(hex_str.len(), 66);
        assert!(hex_str.starts_with("ED"));
        assert_eq!(&PublicKey::from_hex(&hex_str).unwrap(), kp.public_key());
    }

    #[test]
    fn account_public_key_base58_starts_with_a() {
        let kp = derive_keypair(&[9u8; 16], Algorithm::Secp256k1).unwrap();
        assert!(kp.public_key().to_base58().starts_with('a'));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = derive_keypair(&[11u8; 16], Algorithm::Ed25519).unwrap();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("KeyPair(ed25519, pub=ED"));
        assert!(!debug_str.contains(&hex::encode_upper(kp.secret_bytes())));
    }

    #[test]
    fn algorithm_parses_case_insensitively() {
        assert_eq!("ED25519".parse::<Algorithm>().unwrap(), Algorithm::Ed25519);
        assert_eq!("secp256k1".parse::<Algorithm>().unwrap(), Algorithm::Secp256k1);
        assert!("rsa".parse::<Algorithm>().is_err());
    }
}
