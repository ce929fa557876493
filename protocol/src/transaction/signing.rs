//! Transaction signing.
//!
//! What gets signed is never the JSON and never the full encoding:
//!
//! ```text
//! data = "STX\0" || encode(tx, signing_fields_only = true)
//! ```
//!
//! `TxnSignature` and `Signers` are not signing fields, so attaching a
//! signature does not change the signed bytes. `SigningPubKey` is, so the
//! key has to be in place before signing.

use std::fmt;
use thiserror::Error;

use crate::address::AccountId;
use crate::codec::{encode, CodecError, FieldValue, TransactionObject};
use crate::config::{HASH_PREFIX_TRANSACTION_ID, HASH_PREFIX_TRANSACTION_SIGN};
use crate::crypto::hash::sha512_half;
use crate::crypto::keys::{Algorithm, KeyPair, PublicKey};
use crate::crypto::signatures::{self, Signature, SignatureError};

pub(crate) const SIGNING_PUB_KEY: &str = "SigningPubKey";
pub(crate) const TXN_SIGNATURE: &str = "TxnSignature";

/// Errors that can occur while signing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignError {
    /// The digest and the key belong to different algorithms.
    #[error("digest prepared for {digest} cannot be signed with a {key} key")]
    AlgorithmMismatch { digest: Algorithm, key: Algorithm },

    /// The transaction already names a different signing key.
    #[error("transaction SigningPubKey {found} does not match signing key {expected}")]
    PublicKeyMismatch { expected: String, found: String },

    /// A field the operation needs is absent or has the wrong type.
    #[error("missing or malformed field {0}")]
    MissingField(String),

    /// The key material could not be loaded.
    #[error("invalid signing key")]
    InvalidKey,

    /// The same account appears twice in a signer list.
    #[error("duplicate signer {0}")]
    DuplicateSigner(AccountId),

    /// The transaction could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<SignatureError> for SignError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::AlgorithmMismatch { digest, key } => Self::AlgorithmMismatch { digest, key },
            SignatureError::InvalidKey => Self::InvalidKey,
        }
    }
}

/// The bytes a single signer signs: `STX\0` followed by the
/// signing-fields-only encoding.
pub fn signing_data(tx: &TransactionObject) -> Result<Vec<u8>, CodecError> {
    let body = encode(tx, true)?;
    let mut data = Vec::with_capacity(HASH_PREFIX_TRANSACTION_SIGN.len() + body.len());
    data.extend_from_slice(&HASH_PREFIX_TRANSACTION_SIGN);
    data.extend_from_slice(&body);
    Ok(data)
}

/// Sign `tx` as it stands.
///
/// If `tx` carries a non-empty `SigningPubKey`, it must be `keypair`'s
/// public key; otherwise the signature could never verify.
///
/// # Errors
///
/// [`SignError::PublicKeyMismatch`] as above, [`SignError::Codec`] if the
/// transaction does not encode.
pub fn sign(tx: &TransactionObject, keypair: &KeyPair) -> Result<Signature, SignError> {
    check_signing_key(tx, keypair.public_key())?;
    let data = signing_data(tx)?;
    let signature = signatures::sign_message(keypair, &data)?;
    tracing::debug!(
        algorithm = %keypair.algorithm(),
        signer = %keypair.account_id(),
        data_len = data.len(),
        "signed transaction"
    );
    Ok(signature)
}

/// Check `signature` over `tx` against `public_key`.
///
/// The signed bytes are recomputed from `tx`; nothing attached to the
/// transaction is trusted. Any failure, including an unencodable
/// transaction, is `false`.
pub fn verify(tx: &TransactionObject, signature: &Signature, public_key: &PublicKey) -> bool {
    match signing_data(tx) {
        Ok(data) => signatures::verify_message(public_key, &data, signature),
        Err(_) => false,
    }
}

fn check_signing_key(tx: &TransactionObject, public_key: &PublicKey) -> Result<(), SignError> {
    match tx.get(SIGNING_PUB_KEY) {
        None => Ok(()),
        Some(FieldValue::Blob(bytes)) if bytes.is_empty() || bytes[..] == public_key.as_bytes()[..] => Ok(()),
        Some(FieldValue::Blob(bytes)) => Err(SignError::PublicKeyMismatch {
            expected: public_key.to_hex(),
            found: hex::encode_upper(bytes),
        }),
        Some(_) => Err(SignError::MissingField(SIGNING_PUB_KEY.to_string())),
    }
}

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// A transaction with its signature attached, plus its final encoding and
/// hash.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx: TransactionObject,
    /// Full canonical encoding, ready for submission.
    pub blob: Vec<u8>,
    /// Transaction ID: `SHA-512Half("TXN\0" || blob)`.
    pub hash: [u8; 32],
}

impl SignedTransaction {
    pub(crate) fn from_tx(tx: TransactionObject) -> Result<Self, CodecError> {
        let blob = encode(&tx, false)?;
        let hash = hash_blob(&blob);
        Ok(Self { tx, blob, hash })
    }

    pub fn blob_hex(&self) -> String {
        hex::encode_upper(&self.blob)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode_upper(self.hash)
    }
}

impl fmt::Debug for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedTransaction")
            .field("hash", &self.hash_hex())
            .field("blob_len", &self.blob.len())
            .finish()
    }
}

/// Attach `SigningPubKey`, sign, attach `TxnSignature`, and encode.
///
/// `tx` itself is left untouched.
///
/// # Example
///
/// ```
/// use ripple_codec::codec::{Amount, TransactionObject};
/// use ripple_codec::crypto::keys::{derive_keypair, Algorithm};
/// use ripple_codec::transaction::{sign_transaction, verify_signed};
///
/// let kp = derive_keypair(&[1u8; 16], Algorithm::Ed25519).unwrap();
/// let tx = TransactionObject::new()
///     .with("TransactionType", 0u16)
///     .with("Account", kp.account_id())
///     .with("Destination", kp.account_id())
///     .with("Amount", Amount::Native(1))
///     .with("Fee", Amount::Native(10))
///     .with("Sequence", 1u32);
///
/// let signed = sign_transaction(&tx, &kp).unwrap();
/// assert!(verify_signed(&signed.tx));
/// ```
pub fn sign_transaction(tx: &TransactionObject, keypair: &KeyPair) -> Result<SignedTransaction, SignError> {
    check_signing_key(tx, keypair.public_key())?;

    let mut tx = tx.clone();
    tx.remove(TXN_SIGNATURE);
    tx.insert(SIGNING_PUB_KEY, keypair.public_key().as_bytes().to_vec());

    let signature = sign(&tx, keypair)?;
    tx.insert(TXN_SIGNATURE, signature.as_bytes().to_vec());

    let signed = SignedTransaction::from_tx(tx)?;
    tracing::debug!(hash = %signed.hash_hex(), blob_len = signed.blob.len(), "transaction ready");
    Ok(signed)
}

/// Transaction ID of `tx` in its current form: `SHA-512Half("TXN\0" ||
/// encode(tx))`.
pub fn transaction_hash(tx: &TransactionObject) -> Result<[u8; 32], CodecError> {
    Ok(hash_blob(&encode(tx, false)?))
}

pub(crate) fn hash_blob(blob: &[u8]) -> [u8; 32] {
    let mut data = Vec::with_capacity(HASH_PREFIX_TRANSACTION_ID.len() + blob.len());
    data.extend_from_slice(&HASH_PREFIX_TRANSACTION_ID);
    data.extend_from_slice(blob);
    sha512_half(&data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
