//! Versioned base58check in the ledger alphabet.
//!
//! `payload = version || data`, `string = base58(payload || checksum)` where
//! `checksum` is the first four bytes of `SHA-256(SHA-256(payload))`. The
//! checksum and alphabet handling are delegated to `bs58`.

use thiserror::Error;

/// Failures when decoding a versioned base58check string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Base58Error {
    /// Not valid base58, or the checksum does not match.
    #[error("invalid base58check string: {0}")]
    Decode(String),

    /// Decoded fine, but the version prefix is not the one we expected.
    #[error("unexpected version prefix: expected {expected}, got {got}")]
    WrongVersion { expected: String, got: String },

    /// Decoded payload has the wrong length for this kind of value.
    #[error("unexpected payload length: expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// Encode `data` behind `version` as a base58check string.
pub fn encode_versioned(version: &[u8], data: &[u8]) -> String {
    let mut payload = Vec::with_capacity(version.len() + data.len());
    payload.extend_from_slice(version);
    payload.extend_from_slice(data);
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check()
        .into_string()
}

/// Decode a base58check string without interpreting the version prefix.
///
/// Returns the payload *including* the version bytes, with the checksum
/// stripped.
pub fn decode_checked(s: &str) -> Result<Vec<u8>, Base58Error> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check(None)
        .into_vec()
        .map_err(|e| Base58Error::Decode(e.to_string()))
}

/// Decode a base58check string and require a specific version prefix and
/// payload length.
pub fn decode_versioned(s: &str, version: &[u8], length: usize) -> Result<Vec<u8>, Base58Error> {
    let payload = decode_checked(s)?;
    if !payload.starts_with(version) {
        let got_len = version.len().min(payload.len());
        return Err(Base58Error::WrongVersion {
            expected: hex::encode(version),
            got: hex::encode(&payload[..got_len]),
        });
    }
    let data = &payload[version.len()..];
    if data.len() != length {
        return Err(Base58Error::WrongLength {
            expected: length,
            got: data.len(),
        });
    }
    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ACCOUNT_ID_VERSION, BASE58_ALPHABET};

    #[test]
    fn alphabet_matches_config() {
        // Encoding the single byte 0..57 (no check) must walk the alphabet.
        for (i, expected) in BASE58_ALPHABET.chars().enumerate().skip(1) {
            let encoded = bs58::encode([i as u8])
                .with_alphabet(bs58::Alphabet::RIPPLE)
                .into_string();
            assert_eq!(encoded, expected.to_string());
        }
    }

    #[test]
    fn zero_account_encodes_to_well_known_address() {
        let encoded = encode_versioned(&[ACCOUNT_ID_VERSION], &[0u8; 20]);
        assert_eq!(encoded, "rrrrrrrrrrrrrrrrrrrrrhoLvTp");
    }

    #[test]
    fn decode_round_trips_payload() {
        let data = [7u8; 20];
        let encoded = encode_versioned(&[ACCOUNT_ID_VERSION], &data);
        let decoded = decode_versioned(&encoded, &[ACCOUNT_ID_VERSION], 20).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut encoded = encode_versioned(&[ACCOUNT_ID_VERSION], &[9u8; 20]);
        // Swap the last character for a different alphabet symbol.
        let last = encoded.pop().unwrap();
        encoded.push(if last == 'r' { 'p' } else { 'r' });
        assert!(matches!(decode_checked(&encoded), Err(Base58Error::Decode(_))));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let encoded = encode_versioned(&[0x21], &[1u8; 16]);
        let err = decode_versioned(&encoded, &[ACCOUNT_ID_VERSION], 16).unwrap_err();
        assert!(matches!(err, Base58Error::WrongVersion { .. }));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let encoded = encode_versioned(&[ACCOUNT_ID_VERSION], &[1u8; 16]);
        let err = decode_versioned(&encoded, &[ACCOUNT_ID_VERSION], 20).unwrap_err();
        assert_eq!(err, Base58Error::WrongLength { expected: 20, got: 16 });
    }

    #[test]
    fn characters_outside_alphabet_are_rejected() {
        // '0' and 'l' are not in the ledger alphabet.
        assert!(decode_checked("r0lrrrrrrrrrrrrrrrrrrhoLvTp").is_err());
    }
}
