//! # Protocol Configuration & Constants
//!
//! Every magic number in the codec lives here. If you're hardcoding a
//! prefix or a length somewhere else, move it here.
//!
//! These values are defined by the ledger protocol, not by us. Changing any
//! of them produces bytes that no other implementation will accept, and
//! signatures that no validator will verify.

// ---------------------------------------------------------------------------
// Hash Prefixes
// ---------------------------------------------------------------------------

/// Prepended to the signing-fields-only encoding before single-signing.
/// ASCII `"STX\0"`.
pub const HASH_PREFIX_TRANSACTION_SIGN: [u8; 4] = [0x53, 0x54, 0x58, 0x00];

/// Prepended to the signing-fields-only encoding before multi-signing.
/// ASCII `"SMT\0"`.
pub const HASH_PREFIX_TRANSACTION_MULTISIGN: [u8; 4] = [0x53, 0x4D, 0x54, 0x00];

/// Prepended to the full encoding when computing a transaction ID.
/// ASCII `"TXN\0"`.
pub const HASH_PREFIX_TRANSACTION_ID: [u8; 4] = [0x54, 0x58, 0x4E, 0x00];

// ---------------------------------------------------------------------------
// Base58 Version Bytes
// ---------------------------------------------------------------------------

/// Version byte for classic account addresses. Encodes to a leading `r`.
pub const ACCOUNT_ID_VERSION: u8 = 0x00;

/// Version byte for account public keys. Encodes to a leading `a`.
pub const ACCOUNT_PUBLIC_KEY_VERSION: u8 = 0x23;

/// Version prefix for secp256k1 family seeds. Encodes to a leading `s`.
pub const SECP256K1_SEED_VERSION: [u8; 1] = [0x21];

/// Version prefix for Ed25519 seeds. Encodes to a leading `sEd`.
pub const ED25519_SEED_VERSION: [u8; 3] = [0x01, 0xE1, 0x4B];

/// The ledger's base58 alphabet. Same size as Bitcoin's, different order,
/// so Bitcoin tooling will happily decode these strings into garbage.
pub const BASE58_ALPHABET: &str = "rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz";

// ---------------------------------------------------------------------------
// Key Material
// ---------------------------------------------------------------------------

/// Seed entropy length. 128 bits, regardless of algorithm.
pub const SEED_LENGTH: usize = 16;

/// Account identifiers are RIPEMD-160 digests.
pub const ACCOUNT_ID_LENGTH: usize = 20;

/// All public keys are 33 bytes on the wire: a compressed secp256k1 point,
/// or `0xED` followed by a 32-byte Ed25519 point.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Private scalar length for both algorithms.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Ed25519 public keys carry this prefix byte so they have the same width
/// as compressed secp256k1 keys and can be told apart by the first byte.
pub const ED25519_KEY_PREFIX: u8 = 0xED;

/// Upper bound on the secp256k1 scalar search. The chance of a single
/// SHA-512Half candidate falling outside `[1, n)` is about 2^-128.
pub const KEY_DERIVATION_MAX_ATTEMPTS: u32 = 128;

/// Account index used for the intermediate secp256k1 key. The protocol
/// only ever uses index 0 for accounts.
pub const DEFAULT_ACCOUNT_INDEX: u32 = 0;

// ---------------------------------------------------------------------------
// Encoding Limits
// ---------------------------------------------------------------------------

/// Largest length a 1-byte VL prefix can carry.
pub const VL_ONE_BYTE_MAX: usize = 192;

/// Largest length a 2-byte VL prefix can carry.
pub const VL_TWO_BYTE_MAX: usize = 12_480;

/// Largest length a 3-byte VL prefix can carry. Anything above this cannot
/// be encoded at all.
pub const VL_THREE_BYTE_MAX: usize = 918_744;

/// Maximum object/array nesting accepted by the decoder and produced by the
/// encoder. Real transactions nest three or four levels deep.
pub const MAX_NESTING_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Total native supply in drops (100 billion XRP). No valid native amount
/// exceeds this.
pub const MAX_NATIVE_DROPS: u64 = 100_000_000_000_000_000;

/// Issued-amount mantissas are normalized into `[MIN_IOU_MANTISSA, MAX_IOU_MANTISSA]`.
pub const MIN_IOU_MANTISSA: u64 = 1_000_000_000_000_000;

/// See [`MIN_IOU_MANTISSA`].
pub const MAX_IOU_MANTISSA: u64 = 9_999_999_999_999_999;

/// Smallest exponent of a normalized issued amount.
pub const MIN_IOU_EXPONENT: i32 = -96;

/// Largest exponent of a normalized issued amount.
pub const MAX_IOU_EXPONENT: i32 = 80;

/// Issued amounts carry at most this many significant decimal digits.
pub const MAX_IOU_PRECISION: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_prefixes_spell_their_names() {
        assert_eq!(&HASH_PREFIX_TRANSACTION_SIGN[..3], b"STX");
        assert_eq!(&HASH_PREFIX_TRANSACTION_MULTISIGN[..3], b"SMT");
        assert_eq!(&HASH_PREFIX_TRANSACTION_ID[..3], b"TXN");
    }

    #[test]
    fn two_byte_vl_range_spans_48_lead_bytes() {
        // Lead bytes 193..=240, each with 256 trailing values.
        assert_eq!(VL_ONE_BYTE_MAX + 48 * 256, VL_TWO_BYTE_MAX);
    }

    #[test]
    fn alphabet_has_58_unique_symbols() {
        let mut chars: Vec<char> = BASE58_ALPHABET.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), 58);
        assert!(BASE58_ALPHABET.starts_with('r'));
    }
}
