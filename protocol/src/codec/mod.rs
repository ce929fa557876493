//! # Canonical Binary Codec
//!
//! Converts between [`TransactionObject`]s and the ledger's canonical
//! binary form. Two encoders that agree on the field table produce the same
//! bytes for the same object, which is what lets a signature made here be
//! verified anywhere.
//!
//! ## Wire layout
//!
//! ```text
//! object   := field*                       (top level: no end marker)
//! field    := header payload
//! header   := 1..3 bytes packing (type_code, field_code)
//! payload  := fixed-width bytes
//!           | VL-prefix bytes              (Blob, AccountID, Vector256)
//!           | amount                       (8 or 48 bytes)
//!           | field* 0xE1                  (STObject)
//!           | (header field* 0xE1)* 0xF1   (STArray of wrapper objects)
//!           | pathset                      (steps, 0xFF between paths, 0x00 end)
//! ```
//!
//! Fields within every object are sorted by `(type_code, field_code)`.
//! Decoding insists on that order, so every accepted byte string has
//! exactly one in-memory form and `encode(decode(b)) == b`.

pub mod amount;
mod deserializer;
pub mod error;
pub mod field_id;
pub mod json;
pub mod length;
mod serializer;
pub mod value;

pub use amount::{Amount, AmountError, Currency, IouValue, IssuedAmount};
pub use error::CodecError;
pub use json::{from_json, to_json};
pub use value::{ArrayEntry, FieldValue, PathStep, TransactionObject};

use crate::definitions::FieldRegistry;
use deserializer::BinaryParser;
use serializer::BinarySerializer;

/// Header byte of `ObjectEndMarker` (STObject, field 1).
pub const OBJECT_END_MARKER: u8 = 0xE1;

/// Header byte of `ArrayEndMarker` (STArray, field 1).
pub const ARRAY_END_MARKER: u8 = 0xF1;

pub(crate) const PATH_SEPARATOR: u8 = 0xFF;
pub(crate) const PATH_SET_END: u8 = 0x00;
pub(crate) const PATH_STEP_ACCOUNT: u8 = 0x01;
pub(crate) const PATH_STEP_CURRENCY: u8 = 0x10;
pub(crate) const PATH_STEP_ISSUER: u8 = 0x20;

/// Encode `obj` in canonical form.
///
/// With `signing_fields_only`, top-level fields that signatures do not
/// cover (`TxnSignature`, `Signers`, ...) are left out. This is the form
/// that gets signed.
///
/// # Errors
///
/// [`CodecError::UnknownField`] for names missing from the registry,
/// [`CodecError::TypeMismatch`] for values of the wrong variant,
/// [`CodecError::InvalidValue`] and [`CodecError::LengthOverflow`] for
/// values that cannot be represented, [`CodecError::NestingTooDeep`] past
/// the depth limit.
///
/// # Example
///
/// ```
/// use ripple_codec::codec::{encode, TransactionObject};
///
/// let tx = TransactionObject::new()
///     .with("TransactionType", 0u16)
///     .with("Sequence", 1u32);
/// assert_eq!(encode(&tx, false).unwrap(), [0x12, 0x00, 0x00, 0x24, 0, 0, 0, 1]);
/// ```
pub fn encode(obj: &TransactionObject, signing_fields_only: bool) -> Result<Vec<u8>, CodecError> {
    let mut serializer = BinarySerializer::new(FieldRegistry::global());
    serializer.write_root(obj, signing_fields_only)?;
    let bytes = serializer.into_bytes();
    tracing::debug!(
        fields = obj.len(),
        bytes = bytes.len(),
        signing_fields_only,
        "encoded object"
    );
    Ok(bytes)
}

/// Decode canonical bytes into an object.
///
/// # Errors
///
/// [`CodecError::MalformedEncoding`], [`CodecError::UnbalancedNesting`] or
/// [`CodecError::NestingTooDeep`], each with the offset where parsing
/// stopped.
pub fn decode(bytes: &[u8]) -> Result<TransactionObject, CodecError> {
    let obj = BinaryParser::new(FieldRegistry::global(), bytes).parse()?;
    tracing::debug!(bytes = bytes.len(), fields = obj.len(), "decoded object");
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccountId;
    use crate::config::MAX_NESTING_DEPTH;
    use crate::definitions::SerializedType;

    fn account(address: &str) -> AccountId {
        AccountId::from_address(address).unwrap()
    }

    fn payment() -> TransactionObject {
        TransactionObject::new()
            .with("TransactionType", 0u16)
            .with("Flags", 0u32)
            .with("Sequence", 1u32)
            .with("Amount", Amount::Native(1_000_000))
            .with("Fee", Amount::Native(10))
            .with("Account", account("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"))
            .with("Destination", account("rf1BiGeXwwQoi8Z2ueFYTEXSwuJYfV2Jpn"))
    }

    fn memo(data: &[u8]) -> ArrayEntry {
        ArrayEntry::new(
            "Memo",
            TransactionObject::new()
                .with("MemoType", b"text".to_vec())
                .with("MemoData", data.to_vec()),
        )
    }

    #[test]
    fn payment_prefix_bytes() {
        let bytes = encode(&payment(), false).unwrap();
        let hex_str = hex::encode_upper(&bytes);
        assert!(hex_str.starts_with(
            "120000\
             2200000000\
             2400000001\
             6140000000000F4240\
             68400000000000000A\
             8114"
        ));
        // Account then Destination, both VL-prefixed with 20.
        assert_eq!(bytes.len(), 3 + 5 + 5 + 9 + 9 + 22 + 22);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = payment();
        let mut b = TransactionObject::new();
        for (name, value) in a.clone().into_iter().rev() {
            b.insert(name, value);
        }
        assert_eq!(encode(&a, false).unwrap(), encode(&b, false).unwrap());
    }

    #[test]
    fn round_trip_with_nested_arrays() {
        let tx = payment()
            .with("Memos", vec![memo(b"one"), memo(b"two")])
            .with("LastLedgerSequence", 1_000u32)
            .with("TickSize", 5u8)
            .with("InvoiceID", [0xAB; 32]);
        let bytes = encode(&tx, false).unwrap();
        assert_eq!(decode(&bytes).unwrap(), tx);
    }

    #[test]
    fn memos_array_framing() {
        let tx = TransactionObject::new().with("Memos", vec![memo(b"x")]);
        let bytes = encode(&tx, false).unwrap();
        assert_eq!(bytes[0], 0xF9);
        assert_eq!(bytes[1], 0xEA);
        assert_eq!(bytes[bytes.len() - 2], OBJECT_END_MARKER);
        assert_eq!(bytes[bytes.len() - 1], ARRAY_END_MARKER);
    }

    #[test]
    fn signing_filter_drops_signature_only_at_top_level() {
        let tx = payment()
            .with("SigningPubKey", vec![0x02; 33])
            .with("TxnSignature", vec![0x30; 70]);
        let full = encode(&tx, false).unwrap();
        let signing = encode(&tx, true).unwrap();
        assert_eq!(full.len(), signing.len() + 2 + 70);

        let mut without = tx.clone();
        without.remove("TxnSignature");
        assert_eq!(signing, encode(&without, false).unwrap());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let tx = payment().with("Bogus", 1u32);
        assert_eq!(encode(&tx, false), Err(CodecError::UnknownField("Bogus".into())));
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let tx = payment().with("Sequence", 1u16);
        assert_eq!(
            encode(&tx, false),
            Err(CodecError::TypeMismatch {
                field: "Sequence".into(),
                expected: SerializedType::UInt32,
            })
        );
    }

    #[test]
    fn array_element_must_be_object_field() {
        let tx = TransactionObject::new().with(
            "Memos",
            vec![ArrayEntry::new("Fee", TransactionObject::new())],
        );
        assert!(matches!(encode(&tx, false), Err(CodecError::TypeMismatch { .. })));
    }

    #[test]
    fn blob_boundaries() {
        for (len, prefix) in [(192usize, 1usize), (193, 2), (12_480, 2), (12_481, 3)] {
            let tx = TransactionObject::new().with("MemoData", vec![0x5A; len]);
            let bytes = encode(&tx, false).unwrap();
            assert_eq!(bytes.len(), 1 + prefix + len);
            assert_eq!(decode(&bytes).unwrap(), tx);
        }
    }

    #[test]
    fn oversized_blob_overflows() {
        let tx = TransactionObject::new().with("MemoData", vec![0u8; 918_745]);
        assert!(matches!(
            encode(&tx, false),
            Err(CodecError::LengthOverflow { length: 918_745, .. })
        ));
    }

    #[test]
    fn path_set_and_vector256_round_trip() {
        let usd = Currency::from_code("USD").unwrap();
        let hop = PathStep {
            account: Some(account("rf1BiGeXwwQoi8Z2ueFYTEXSwuJYfV2Jpn")),
            ..PathStep::default()
        };
        let swap = PathStep {
            currency: Some(usd),
            issuer: Some(account("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh")),
            ..PathStep::default()
        };
        let tx = TransactionObject::new()
            .with("Paths", FieldValue::PathSet(vec![vec![hop.clone(), swap], vec![hop]]))
            .with("Amendments", vec![[1u8; 32], [2u8; 32]]);
        let bytes = encode(&tx, false).unwrap();
        assert_eq!(decode(&bytes).unwrap(), tx);
    }

    #[test]
    fn empty_path_is_invalid() {
        let tx = TransactionObject::new().with("Paths", FieldValue::PathSet(vec![vec![]]));
        assert!(matches!(encode(&tx, false), Err(CodecError::InvalidValue { .. })));
    }

    #[test]
    fn decode_rejects_truncation() {
        let bytes = encode(&payment(), false).unwrap();
        let err = decode(&bytes[..bytes.len() - 5]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding { .. }));
    }

    #[test]
    fn decode_rejects_out_of_order_and_duplicates() {
        // Sequence (0x24) before Flags (0x22).
        let err = decode(&[0x24, 0, 0, 0, 1, 0x22, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(err, CodecError::malformed(5, "field Flags out of canonical order"));

        let err = decode(&[0x24, 0, 0, 0, 1, 0x24, 0, 0, 0, 2]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding { offset: 5, .. }));
    }

    #[test]
    fn decode_rejects_unknown_type_code() {
        // Type 9 has no definition.
        let err = decode(&[0x91, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding { offset: 0, .. }));
    }

    #[test]
    fn decode_rejects_stray_end_markers() {
        assert!(matches!(
            decode(&[OBJECT_END_MARKER]),
            Err(CodecError::UnbalancedNesting { offset: 0, .. })
        ));
        assert!(matches!(
            decode(&[ARRAY_END_MARKER]),
            Err(CodecError::UnbalancedNesting { offset: 0, .. })
        ));
        // Memos array opened, object end with no element open.
        assert!(matches!(
            decode(&[0xF9, OBJECT_END_MARKER]),
            Err(CodecError::UnbalancedNesting { offset: 1, .. })
        ));
    }

    #[test]
    fn decode_rejects_unclosed_array() {
        let tx = TransactionObject::new().with("Memos", vec![memo(b"x")]);
        let bytes = encode(&tx, false).unwrap();
        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, CodecError::UnbalancedNesting { .. }));
    }

    #[test]
    fn decode_rejects_non_object_array_element() {
        // Memos, then a Sequence field where an element should be.
        let err = decode(&[0xF9, 0x24, 0, 0, 0, 1, ARRAY_END_MARKER]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding { offset: 1, .. }));
    }

    #[test]
    fn nesting_limit_applies_both_ways() {
        let mut bytes = Vec::new();
        for _ in 0..=MAX_NESTING_DEPTH {
            bytes.push(0xF9); // Memos
            bytes.push(0xEA); // Memo
        }
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::NestingTooDeep { .. }));

        let mut obj = TransactionObject::new().with("MemoData", vec![1u8]);
        for _ in 0..MAX_NESTING_DEPTH {
            obj = TransactionObject::new().with("Memos", vec![ArrayEntry::new("Memo", obj)]);
        }
        assert!(matches!(encode(&obj, false), Err(CodecError::NestingTooDeep { .. })));
    }

    #[test]
    fn decode_rejects_bad_account_length() {
        // Account with a 19-byte payload.
        let mut bytes = vec![0x81, 19];
        bytes.extend_from_slice(&[0u8; 19]);
        assert!(matches!(decode(&bytes), Err(CodecError::MalformedEncoding { offset: 1, .. })));
    }

    #[test]
    fn empty_input_is_empty_object() {
        assert!(decode(&[]).unwrap().is_empty());
    }
}
