//! Transaction assembly.
//!
//! [`assemble`] turns a partial field map into a complete transaction of a
//! given type: it sets `TransactionType`, defaults `Flags` to zero, and
//! reports every required field that is still missing. It does not check
//! field types or reject unknown fields; that is the codec's job at encode
//! time.
//!
//! [`TransactionBuilder`] is a fluent front end over the same logic.

use thiserror::Error;

use crate::address::AccountId;
use crate::codec::{from_json, Amount, ArrayEntry, CodecError, FieldValue, TransactionObject};
use crate::definitions::FieldRegistry;

const TRANSACTION_TYPE: &str = "TransactionType";
const FLAGS: &str = "Flags";

/// Errors that can occur while assembling a transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    /// One or more required fields are absent. All of them are listed.
    #[error("{tx_type} is missing required fields: {}", .missing.join(", "))]
    MissingRequiredField { tx_type: String, missing: Vec<String> },

    #[error("unknown transaction type {0}")]
    UnknownTransactionType(String),

    /// The partial object already names a different transaction type.
    #[error("transaction type {found} does not match requested {expected}")]
    TransactionTypeMismatch { expected: String, found: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Which transaction types exist and what each one requires.
pub trait TransactionSchema {
    /// Wire code for `tx_type`, or `None` if the type is unknown.
    fn type_code(&self, tx_type: &str) -> Option<u16>;

    /// Name for a wire code.
    fn type_name(&self, code: u16) -> Option<&str>;

    /// Every field a `tx_type` transaction must carry, common fields first.
    fn required_fields(&self, tx_type: &str) -> Vec<&str>;
}

/// The schema shipped in the field registry's `TRANSACTION_FORMATS`.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolSchema<'r> {
    registry: &'r FieldRegistry,
}

impl<'r> ProtocolSchema<'r> {
    pub fn new(registry: &'r FieldRegistry) -> Self {
        Self { registry }
    }
}

impl Default for ProtocolSchema<'static> {
    fn default() -> Self {
        Self::new(FieldRegistry::global())
    }
}

impl TransactionSchema for ProtocolSchema<'_> {
    fn type_code(&self, tx_type: &str) -> Option<u16> {
        self.registry.transaction_type_code(tx_type)
    }

    fn type_name(&self, code: u16) -> Option<&str> {
        self.registry.transaction_type_name(code)
    }

    fn required_fields(&self, tx_type: &str) -> Vec<&str> {
        let common = self.registry.common_required_fields().iter();
        let specific = self.registry.transaction_format(tx_type).unwrap_or_default().iter();
        common.chain(specific).map(String::as_str).collect()
    }
}

// ---------------------------------------------------------------------------
// assemble
// ---------------------------------------------------------------------------

/// Complete `partial` as a `tx_type` transaction using the built-in schema.
pub fn assemble(partial: TransactionObject, tx_type: &str) -> Result<TransactionObject, AssembleError> {
    assemble_with(&ProtocolSchema::default(), partial, tx_type)
}

/// Complete `partial` as a `tx_type` transaction using `schema`.
pub fn assemble_with<S: TransactionSchema + ?Sized>(
    schema: &S,
    mut partial: TransactionObject,
    tx_type: &str,
) -> Result<TransactionObject, AssembleError> {
    let code = schema
        .type_code(tx_type)
        .ok_or_else(|| AssembleError::UnknownTransactionType(tx_type.to_string()))?;

    match partial.get(TRANSACTION_TYPE) {
        None => {}
        Some(FieldValue::UInt16(existing)) if *existing == code => {}
        Some(FieldValue::UInt16(existing)) => {
            return Err(AssembleError::TransactionTypeMismatch {
                expected: tx_type.to_string(),
                found: schema
                    .type_name(*existing)
                    .map(str::to_string)
                    .unwrap_or_else(|| existing.to_string()),
            })
        }
        Some(other) => {
            return Err(AssembleError::TransactionTypeMismatch {
                expected: tx_type.to_string(),
                found: format!("{:?}", other),
            })
        }
    }

    partial.insert(TRANSACTION_TYPE, code);
    if !partial.contains(FLAGS) {
        partial.insert(FLAGS, 0u32);
    }

    let missing: Vec<String> = schema
        .required_fields(tx_type)
        .into_iter()
        .filter(|name| !partial.contains(name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(AssembleError::MissingRequiredField {
            tx_type: tx_type.to_string(),
            missing,
        });
    }

    tracing::trace!(tx_type, fields = partial.len(), "assembled transaction");
    Ok(partial)
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder over [`assemble`].
///
/// ```
/// use ripple_codec::address::AccountId;
/// use ripple_codec::codec::Amount;
/// use ripple_codec::transaction::TransactionBuilder;
///
/// let tx = TransactionBuilder::new("Payment")
///     .account(AccountId::from_address("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").unwrap())
///     .destination(AccountId::from_address("rf1BiGeXwwQoi8Z2ueFYTEXSwuJYfV2Jpn").unwrap())
///     .amount(Amount::Native(1_000_000))
///     .fee(10)
///     .sequence(1)
///     .build()
///     .unwrap();
///
/// assert_eq!(tx.get_u16("TransactionType"), Some(0));
/// assert_eq!(tx.get_u32("Flags"), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx_type: String,
    fields: TransactionObject,
    memos: Vec<ArrayEntry>,
}

impl TransactionBuilder {
    pub fn new(tx_type: impl Into<String>) -> Self {
        Self {
            tx_type: tx_type.into(),
            fields: TransactionObject::new(),
            memos: Vec::new(),
        }
    }

    /// Start from a JSON transaction. The type is taken from its
    /// `TransactionType`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AssembleError> {
        let tx_type = value
            .get(TRANSACTION_TYPE)
            .and_then(|v| v.as_str())
            .ok_or_else(|| AssembleError::MissingRequiredField {
                tx_type: "?".to_string(),
                missing: vec![TRANSACTION_TYPE.to_string()],
            })?
            .to_string();
        let fields = from_json(value)?;
        Ok(Self {
            tx_type,
            fields,
            memos: Vec::new(),
        })
    }

    pub fn account(self, account: AccountId) -> Self {
        self.field("Account", account)
    }

    pub fn destination(self, destination: AccountId) -> Self {
        self.field("Destination", destination)
    }

    pub fn amount(self, amount: Amount) -> Self {
        self.field("Amount", amount)
    }

    /// Fee in drops.
    pub fn fee(self, drops: u64) -> Self {
        self.field("Fee", Amount::Native(drops))
    }

    pub fn sequence(self, sequence: u32) -> Self {
        self.field("Sequence", sequence)
    }

    pub fn flags(self, flags: u32) -> Self {
        self.field(FLAGS, flags)
    }

    pub fn last_ledger_sequence(self, ledger: u32) -> Self {
        self.field("LastLedgerSequence", ledger)
    }

    pub fn destination_tag(self, tag: u32) -> Self {
        self.field("DestinationTag", tag)
    }

    /// Append a memo. Memos keep the order they were added in.
    pub fn memo(mut self, memo_type: &[u8], memo_data: &[u8]) -> Self {
        let memo = TransactionObject::new()
            .with("MemoType", memo_type.to_vec())
            .with("MemoData", memo_data.to_vec());
        self.memos.push(ArrayEntry::new("Memo", memo));
        self
    }

    /// Set any field by name.
    pub fn field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name, value);
        self
    }

    pub fn build(self) -> Result<TransactionObject, AssembleError> {
        self.build_with(&ProtocolSchema::default())
    }

    pub fn build_with<S: TransactionSchema + ?Sized>(
        mut self,
        schema: &S,
    ) -> Result<TransactionObject, AssembleError> {
        if !self.memos.is_empty() {
            self.fields.insert("Memos", self.memos);
        }
        assemble_with(schema, self.fields, &self.tx_type)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};

    fn alice() -> AccountId {
        AccountId::from_address("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").unwrap()
    }

    fn bob() -> AccountId {
        AccountId::from_address("rf1BiGeXwwQoi8Z2ueFYTEXSwuJYfV2Jpn").unwrap()
    }

    fn partial_payment() -> TransactionObject {
        TransactionObject::new()
            .with("Account", alice())
            .with("Destination", bob())
            .with("Amount", Amount::Native(1_000_000))
            .with("Fee", Amount::Native(10))
            .with("Sequence", 1u32)
    }

    #[test]
    fn assemble_sets_type_and_default_flags() {
        let tx = assemble(partial_payment(), "Payment").unwrap();
        assert_eq!(tx.get_u16("TransactionType"), Some(0));
        assert_eq!(tx.get_u32("Flags"), Some(0));
    }

    #[test]
    fn explicit_flags_are_kept() {
        let tx = assemble(partial_payment().with("Flags", 0x8000_0000u32), "Payment").unwrap();
        assert_eq!(tx.get_u32("Flags"), Some(0x8000_0000));
    }

    #[test]
    fn all_missing_fields_are_reported() {
        let partial = TransactionObject::new().with("Account", alice());
        assert_eq!(
            assemble(partial, "Payment"),
            Err(AssembleError::MissingRequiredField {
                tx_type: "Payment".into(),
                missing: vec!["Fee".into(), "Sequence".into(), "Amount".into(), "Destination".into()],
            })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert_eq!(
            assemble(partial_payment(), "Teleport"),
            Err(AssembleError::UnknownTransactionType("Teleport".into()))
        );
    }

    #[test]
    fn conflicting_type_is_rejected() {
        let partial = partial_payment().with("TransactionType", 8u16);
        assert_eq!(
            assemble(partial, "Payment"),
            Err(AssembleError::TransactionTypeMismatch {
                expected: "Payment".into(),
                found: "OfferCancel".into(),
            })
        );
    }

    #[test]
    fn unknown_extra_fields_pass_through_to_the_codec() {
        let tx = assemble(partial_payment().with("Bogus", 1u32), "Payment").unwrap();
        assert!(tx.contains("Bogus"));
        assert!(encode(&tx, false).is_err());
    }

    #[test]
    fn custom_schema_is_honoured() {
        struct Strict;
        impl TransactionSchema for Strict {
            fn type_code(&self, tx_type: &str) -> Option<u16> {
                (tx_type == "Payment").then_some(0)
            }
            fn type_name(&self, code: u16) -> Option<&str> {
                (code == 0).then_some("Payment")
            }
            fn required_fields(&self, _: &str) -> Vec<&str> {
                vec!["Account", "DestinationTag"]
            }
        }
        let err = assemble_with(&Strict, partial_payment(), "Payment").unwrap_err();
        assert_eq!(
            err,
            AssembleError::MissingRequiredField {
                tx_type: "Payment".into(),
                missing: vec!["DestinationTag".into()],
            }
        );
    }

    #[test]
    fn builder_with_memos_encodes() {
        let tx = TransactionBuilder::new("Payment")
            .account(alice())
            .destination(bob())
            .amount(Amount::Native(25))
            .fee(12)
            .sequence(3)
            .memo(b"text/plain", b"hello")
            .memo(b"text/plain", b"again")
            .build()
            .unwrap();
        assert_eq!(tx.get_array("Memos").map(|m| m.len()), Some(2));
        assert_eq!(decode(&encode(&tx, false).unwrap()).unwrap(), tx);
    }

    #[test]
    fn builder_from_json() {
        let json = serde_json::json!({
            "TransactionType": "OfferCancel",
            "Account": "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
            "Fee": "12",
            "Sequence": 4,
            "OfferSequence": 2,
        });
        let tx = TransactionBuilder::from_json(&json).unwrap().build().unwrap();
        assert_eq!(tx.get_u16("TransactionType"), Some(8));
        assert_eq!(tx.get_u32("OfferSequence"), Some(2));
    }
}
