//! # Account Addresses
//!
//! An account on the ledger is identified by 20 bytes derived from its
//! master public key:
//!
//! ```text
//! public_key (33 bytes)
//!     -> SHA-256 -> RIPEMD-160 -> account_id (20 bytes)
//!     -> base58check(0x00 || account_id) -> rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh
//! ```
//!
//! The binary form is what goes on the wire (VL-prefixed, see the codec);
//! the `r…` form is what humans paste into payment forms. The checksum
//! catches typos before they become lost funds.

pub mod base58;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ACCOUNT_ID_LENGTH, ACCOUNT_ID_VERSION};
use crate::crypto::hash::hash160;
use base58::Base58Error;

/// Errors that can occur while parsing an account identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The base58check layer rejected the string.
    #[error("invalid address: {0}")]
    Base58(#[from] Base58Error),

    /// Hex input did not decode.
    #[error("invalid account id hex: {0}")]
    Hex(String),

    /// Raw bytes had the wrong length.
    #[error("invalid account id length: expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// A 20-byte account identifier.
///
/// Ordering is bytewise, which is also the order multi-signers must appear
/// in a `Signers` array.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// Wrap raw account-id bytes.
    pub fn from_bytes(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, checking the length.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; ACCOUNT_ID_LENGTH] =
            slice.try_into().map_err(|_| AddressError::WrongLength {
                expected: ACCOUNT_ID_LENGTH,
                got: slice.len(),
            })?;
        Ok(Self(bytes))
    }

    /// Derive the account id of a 33-byte public key.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Self(hash160(public_key))
    }

    /// Parse an `r…` address.
    pub fn from_address(address: &str) -> Result<Self, AddressError> {
        let bytes = base58::decode_versioned(address, &[ACCOUNT_ID_VERSION], ACCOUNT_ID_LENGTH)?;
        Self::try_from_slice(&bytes)
    }

    /// Encode as an `r…` address.
    pub fn to_address(&self) -> String {
        base58::encode_versioned(&[ACCOUNT_ID_VERSION], &self.0)
    }

    /// Parse 40 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let bytes = hex::decode(s).map_err(|e| AddressError::Hex(e.to_string()))?;
        Self::try_from_slice(&bytes)
    }

    /// Uppercase hex, the form the ledger's JSON uses for raw ids.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_address())
    }
}

impl FromStr for AccountId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_address())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_address(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_zero_and_one() {
        assert_eq!(
            AccountId::from_bytes([0u8; 20]).to_address(),
            "rrrrrrrrrrrrrrrrrrrrrhoLvTp"
        );
        let mut one = [0u8; 20];
        one[19] = 1;
        assert_eq!(
            AccountId::from_bytes(one).to_address(),
            "rrrrrrrrrrrrrrrrrrrrBZbvji"
        );
    }

    #[test]
    fn address_round_trip() {
        let address = "rf1BiGeXwwQoi8Z2ueFYTEXSwuJYfV2Jpn";
        let id = AccountId::from_address(address).unwrap();
        assert_eq!(id.to_address(), address);
        assert_eq!(id.as_bytes().len(), 20);
    }

    #[test]
    fn hex_round_trip() {
        let id = AccountId::from_address("rU4Ai74ohgtUP8evP3qd2HuxWSFvLVt7uh").unwrap();
        let hex_str = id.to_hex();
        assert_eq!(hex_str.len(), 40);
        assert_eq!(AccountId::from_hex(&hex_str).unwrap(), id);
    }

    #[test]
    fn seed_string_is_not_an_address() {
        let err = AccountId::from_address("snoPBrXtMeMyMHUVTgbuqAfg1SUTb").unwrap_err();
        assert!(matches!(err, AddressError::Base58(_)));
    }

    #[test]
    fn wrong_slice_length_rejected() {
        let err = AccountId::try_from_slice(&[0u8; 19]).unwrap_err();
        assert_eq!(err, AddressError::WrongLength { expected: 20, got: 19 });
    }

    #[test]
    fn serde_uses_address_form() {
        let id = AccountId::from_address("rf1BiGeXwwQoi8Z2ueFYTEXSwuJYfV2Jpn").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"rf1BiGeXwwQoi8Z2ueFYTEXSwuJYfV2Jpn\"");
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn from_str_parses_address() {
        let id: AccountId = "rrrrrrrrrrrrrrrrrrrrrhoLvTp".parse().unwrap();
        assert_eq!(id.as_bytes(), &[0u8; 20]);
    }
}
