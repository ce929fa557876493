//! # Cryptographic Primitives
//!
//! Everything key- or hash-shaped flows through here:
//!
//! - **hash**: SHA-512Half, SHA-256 and the RIPEMD-160 account hash.
//! - **seed**: 16-byte seeds and their base58 form.
//! - **keys**: deterministic Ed25519 and secp256k1 key derivation.
//! - **signatures**: digest selection, signing and verification.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. The curve arithmetic, RFC 6979 nonces and EdDSA all come from
//! `secp256k1` and `ed25519-dalek`. What lives here is the ledger-specific
//! glue: which bytes get hashed, how, and in which order.

pub mod hash;
pub mod keys;
pub mod seed;
pub mod signatures;

use lazy_static::lazy_static;
use secp256k1::{All, Secp256k1};

pub use hash::{hash160, sha512_half};
pub use keys::{derive_keypair, derive_keypair_from_seed, Algorithm, KeyError, KeyPair, PublicKey};
pub use seed::Seed;
pub use signatures::{Signature, SignatureError, SigningDigest};

lazy_static! {
    /// One libsecp256k1 context for the whole process. Building one costs
    /// far more than a signature, and it is read-only once built.
    static ref SECP: Secp256k1<All> = Secp256k1::new();
}

pub(crate) fn secp_context() -> &'static Secp256k1<All> {
    &SECP
}
