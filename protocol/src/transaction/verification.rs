//! Verification of signed transactions.
//!
//! Checks, in order:
//!
//! 1. `SigningPubKey` is present and is a valid public key (an empty key
//!    means the transaction is multi-signed, and `Signers` is checked
//!    instead).
//! 2. `TxnSignature` is present.
//! 3. The signature verifies over the signing data recomputed from the
//!    transaction itself.

use thiserror::Error;

use crate::address::AccountId;
use crate::codec::{decode, CodecError, TransactionObject};
use crate::crypto::keys::PublicKey;
use crate::crypto::signatures::Signature;

use super::multisign::check_multisigned;
use super::signing::{signing_data, SIGNING_PUB_KEY, TXN_SIGNATURE};

/// Why a signed transaction failed verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// A field needed for verification is absent or has the wrong type.
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// `SigningPubKey` (or a signer's key) is not a valid public key.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// The signature does not match. Carries the signer for multi-signed
    /// transactions.
    #[error("signature does not verify{}", .0.map(|a| format!(" for signer {}", a)).unwrap_or_default())]
    BadSignature(Option<AccountId>),

    /// `Signers` is not in strictly increasing account order.
    #[error("signer {0} is out of order")]
    UnsortedSigners(AccountId),

    /// Multi-signature checks were asked of a single-signed transaction.
    #[error("transaction carries a single signing key")]
    NotMultisigned,

    /// The transaction could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Like [`verify_signed`], but reports why verification failed.
pub fn check_signed(tx: &TransactionObject) -> Result<(), VerifyError> {
    let key_bytes = tx
        .get_blob(SIGNING_PUB_KEY)
        .ok_or(VerifyError::MissingField(SIGNING_PUB_KEY))?;
    if key_bytes.is_empty() {
        return check_multisigned(tx);
    }
    let public_key = PublicKey::from_slice(key_bytes).map_err(|_| VerifyError::InvalidPublicKey)?;

    let signature = tx
        .get_blob(TXN_SIGNATURE)
        .map(|b| Signature::from_bytes(b.to_vec()))
        .ok_or(VerifyError::MissingField(TXN_SIGNATURE))?;

    let data = signing_data(tx)?;
    if !crate::crypto::signatures::verify_message(&public_key, &data, &signature) {
        tracing::debug!(public_key = %public_key.to_hex(), "signature rejected");
        return Err(VerifyError::BadSignature(None));
    }
    Ok(())
}

/// `true` if `tx` carries a valid single signature, or valid
/// multi-signatures when its `SigningPubKey` is empty.
pub fn verify_signed(tx: &TransactionObject) -> bool {
    check_signed(tx).is_ok()
}

/// Decode `blob` and verify it. Malformed input is simply `false`.
pub fn verify_blob(blob: &[u8]) -> bool {
    decode(blob)
        .map_err(VerifyError::from)
        .and_then(|tx| check_signed(&tx))
        .is_ok()
}
