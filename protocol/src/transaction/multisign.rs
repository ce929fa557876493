//! Multi-signing.
//!
//! Each signer signs `"SMT\0" || encode(tx, signing_fields_only) ||
//! signer_account_id`, with `SigningPubKey` empty on the transaction. The
//! signatures are then collected into `Signers`, sorted by account ID.

use crate::address::AccountId;
use crate::codec::{encode, ArrayEntry, CodecError, FieldValue, TransactionObject};
use crate::config::HASH_PREFIX_TRANSACTION_MULTISIGN;
use crate::crypto::keys::{KeyPair, PublicKey};
use crate::crypto::signatures::{self, Signature};

use super::signing::{SignError, SignedTransaction, SIGNING_PUB_KEY, TXN_SIGNATURE};

pub(crate) const SIGNERS: &str = "Signers";
pub(crate) const SIGNER: &str = "Signer";
const ACCOUNT: &str = "Account";

/// The bytes `signer` signs for a multi-signed `tx`.
pub fn multisigning_data(tx: &TransactionObject, signer: &AccountId) -> Result<Vec<u8>, CodecError> {
    let body = encode(tx, true)?;
    let mut data = Vec::with_capacity(HASH_PREFIX_TRANSACTION_MULTISIGN.len() + body.len() + 20);
    data.extend_from_slice(&HASH_PREFIX_TRANSACTION_MULTISIGN);
    data.extend_from_slice(&body);
    data.extend_from_slice(signer.as_bytes());
    Ok(data)
}

/// Produce one `Signer` entry for `tx`.
///
/// `tx` must not name a signing key of its own; an absent `SigningPubKey`
/// is treated as the empty one a multi-signed transaction carries.
pub fn multisign(tx: &TransactionObject, keypair: &KeyPair) -> Result<ArrayEntry, SignError> {
    let tx = multisign_base(tx)?;
    let account = keypair.account_id();
    let data = multisigning_data(&tx, &account)?;
    let signature = signatures::sign_message(keypair, &data)?;

    tracing::debug!(signer = %account, algorithm = %keypair.algorithm(), "added multisignature");

    let object = TransactionObject::new()
        .with(ACCOUNT, account)
        .with(SIGNING_PUB_KEY, keypair.public_key().as_bytes().to_vec())
        .with(TXN_SIGNATURE, signature.as_bytes().to_vec());
    Ok(ArrayEntry::new(SIGNER, object))
}

/// Assemble a multi-signed transaction from individually produced `Signer`
/// entries.
///
/// Entries are sorted by account ID; the same account twice is an error.
pub fn combine_signers(
    tx: &TransactionObject,
    signers: impl IntoIterator<Item = ArrayEntry>,
) -> Result<SignedTransaction, SignError> {
    let mut tx = multisign_base(tx)?;

    let mut keyed = Vec::new();
    for entry in signers {
        let account = entry
            .object
            .get_account(ACCOUNT)
            .ok_or_else(|| SignError::MissingField(format!("{}.{}", SIGNER, ACCOUNT)))?;
        keyed.push((account, entry));
    }
    if keyed.is_empty() {
        return Err(SignError::MissingField(SIGNERS.to_string()));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some(pair) = keyed.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(SignError::DuplicateSigner(pair[0].0));
    }

    let count = keyed.len();
    tx.insert(SIGNERS, keyed.into_iter().map(|(_, e)| e).collect::<Vec<_>>());
    let signed = SignedTransaction::from_tx(tx)?;
    tracing::debug!(signers = count, hash = %signed.hash_hex(), "combined multisignatures");
    Ok(signed)
}

/// Verify every entry in `Signers` against the transaction.
///
/// Requires an empty `SigningPubKey`, at least one signer, and signers in
/// strictly increasing account order.
pub fn verify_multisigned(tx: &TransactionObject) -> bool {
    check_multisigned(tx).is_ok()
}

pub(crate) fn check_multisigned(tx: &TransactionObject) -> Result<(), super::VerifyError> {
    use super::VerifyError;

    match tx.get_blob(SIGNING_PUB_KEY) {
        Some([]) => {}
        Some(_) => return Err(VerifyError::NotMultisigned),
        None => return Err(VerifyError::MissingField(SIGNING_PUB_KEY)),
    }
    let signers = match tx.get_array(SIGNERS) {
        Some(signers) if !signers.is_empty() => signers,
        _ => return Err(VerifyError::MissingField(SIGNERS)),
    };

    let mut previous: Option<AccountId> = None;
    for entry in signers {
        if entry.name != SIGNER {
            return Err(VerifyError::MissingField(SIGNER));
        }
        let account = entry
            .object
            .get_account(ACCOUNT)
            .ok_or(VerifyError::MissingField(ACCOUNT))?;
        if previous.map_or(false, |p| p >= account) {
            return Err(VerifyError::UnsortedSigners(account));
        }
        previous = Some(account);

        let public_key = entry
            .object
            .get_blob(SIGNING_PUB_KEY)
            .ok_or(VerifyError::MissingField(SIGNING_PUB_KEY))
            .and_then(|b| PublicKey::from_slice(b).map_err(|_| VerifyError::InvalidPublicKey))?;
        let signature = entry
            .object
            .get_blob(TXN_SIGNATURE)
            .map(|b| Signature::from_bytes(b.to_vec()))
            .ok_or(VerifyError::MissingField(TXN_SIGNATURE))?;

        let data = multisigning_data(tx, &account)?;
        if !signatures::verify_message(&public_key, &data, &signature) {
            return Err(VerifyError::BadSignature(Some(account)));
        }
    }
    Ok(())
}

/// `tx` with an empty `SigningPubKey` and no single signature.
fn multisign_base(tx: &TransactionObject) -> Result<TransactionObject, SignError> {
    match tx.get(SIGNING_PUB_KEY) {
        None => {}
        Some(FieldValue::Blob(bytes)) if bytes.is_empty() => {}
        Some(FieldValue::Blob(bytes)) => {
            return Err(SignError::PublicKeyMismatch {
                expected: String::new(),
                found: hex::encode_upper(bytes),
            })
        }
        Some(_) => return Err(SignError::MissingField(SIGNING_PUB_KEY.to_string())),
    }
    let mut tx = tx.clone();
    tx.insert(SIGNING_PUB_KEY, Vec::<u8>::new());
    tx.remove(TXN_SIGNATURE);
    tx.remove(SIGNERS);
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Amount;
    use crate::crypto::keys::{derive_keypair, Algorithm};

    fn signers() -> Vec<KeyPair> {
        vec![
            derive_keypair(&[0x31; 16], Algorithm::Secp256k1).unwrap(),
            derive_keypair(&[0x32; 16], Algorithm::Ed25519).unwrap(),
            derive_keypair(&[0x33; 16], Algorithm::Secp256k1).unwrap(),
        ]
    }

    fn account_set() -> TransactionObject {
        TransactionObject::new()
            .with("TransactionType", 3u16)
            .with("Flags", 0u32)
            .with("Sequence", 5u32)
            .with("Fee", Amount::Native(30))
            .with(
                "Account",
                AccountId::from_address("rU4Ai74ohgtUP8evP3qd2HuxWSFvLVt7uh").unwrap(),
            )
    }

    #[test]
    fn multisigning_data_layout() {
        let tx = account_set();
        let signer = signers()[0].account_id();
        let data = multisigning_data(&tx, &signer).unwrap();
        assert_eq!(&data[..4], b"SMT\0");
        assert_eq!(&data[data.len() - 20..], signer.as_bytes());
    }

    #[test]
    fn combined_signers_verify_and_are_sorted() {
        let tx = account_set();
        let entries: Vec<_> = signers().iter().map(|kp| multisign(&tx, kp).unwrap()).collect();
        let signed = combine_signers(&tx, entries.into_iter().rev()).unwrap();

        assert!(verify_multisigned(&signed.tx));
        assert_eq!(signed.tx.get_blob("SigningPubKey"), Some(&[][..]));

        let accounts: Vec<_> = signed
            .tx
            .get_array(SIGNERS)
            .unwrap()
            .iter()
            .map(|e| e.object.get_account(ACCOUNT).unwrap())
            .collect();
        let mut sorted = accounts.clone();
        sorted.sort();
        assert_eq!(accounts, sorted);
    }

    #[test]
    fn adding_signers_does_not_change_signed_bytes() {
        let tx = account_set();
        let signers = signers();
        let kp = &signers[1];
        let signer = kp.account_id();
        let entry = multisign(&tx, kp).unwrap();
        let signed = combine_signers(&tx, vec![entry]).unwrap();
        assert_eq!(
            multisigning_data(&multisign_base(&tx).unwrap(), &signer).unwrap(),
            multisigning_data(&signed.tx, &signer).unwrap()
        );
    }

    #[test]
    fn duplicate_signer_is_rejected() {
        let tx = account_set();
        let signers = signers();
        let kp = &signers[0];
        let entry = multisign(&tx, kp).unwrap();
        assert_eq!(
            combine_signers(&tx, vec![entry.clone(), entry]),
            Err(SignError::DuplicateSigner(kp.account_id()))
        );
    }

    #[test]
    fn no_signers_is_rejected() {
        assert_eq!(
            combine_signers(&account_set(), Vec::new()),
            Err(SignError::MissingField(SIGNERS.to_string()))
        );
    }

    #[test]
    fn single_signing_key_blocks_multisign() {
        let signers = signers();
        let kp = &signers[0];
        let tx = account_set().with("SigningPubKey", kp.public_key().as_bytes().to_vec());
        assert!(matches!(multisign(&tx, kp), Err(SignError::PublicKeyMismatch { .. })));
    }

    #[test]
    fn tampered_transaction_fails_multisign_verification() {
        let tx = account_set();
        let entries: Vec<_> = signers().iter().map(|kp| multisign(&tx, kp).unwrap()).collect();
        let mut signed = combine_signers(&tx, entries).unwrap();
        signed.tx.insert("Sequence", 6u32);
        assert!(!verify_multisigned(&signed.tx));
    }

    #[test]
    fn unsorted_signers_fail_verification() {
        let tx = account_set();
        let entries: Vec<_> = signers().iter().map(|kp| multisign(&tx, kp).unwrap()).collect();
        let mut signed = combine_signers(&tx, entries).unwrap();
        let mut reversed = signed.tx.get_array(SIGNERS).unwrap().to_vec();
        reversed.reverse();
        signed.tx.insert(SIGNERS, reversed);
        assert!(!verify_multisigned(&signed.tx));
    }
}
