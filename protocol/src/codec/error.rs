//! Error types for the binary codec.
//!
//! Encoding fails on the in-memory side (unknown names, wrong value types,
//! out-of-range values). Decoding fails on the wire side and always reports
//! the byte offset where parsing stopped. Neither direction returns partial
//! output.

use thiserror::Error;

use crate::definitions::{SerializedType, UnknownFieldError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A field name the registry does not know.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Bytes that do not form a canonical encoding.
    #[error("malformed encoding at byte {offset}: {reason}")]
    MalformedEncoding {
        /// Offset of the first byte that could not be accepted.
        offset: usize,
        reason: String,
    },

    /// Object/array end markers that do not match what is open.
    #[error("unbalanced nesting at byte {offset}: {reason}")]
    UnbalancedNesting { offset: usize, reason: String },

    /// Objects and arrays nested past the supported depth.
    #[error("nesting exceeds {limit} levels at byte {offset}")]
    NestingTooDeep { offset: usize, limit: usize },

    /// A value whose variant does not match the field's registered type.
    #[error("field {field} expects a {expected} value")]
    TypeMismatch {
        field: String,
        expected: SerializedType,
    },

    /// A value of the right type that cannot be represented.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// A VL payload too long for the 3-byte length prefix.
    #[error("{field} is {length} bytes, the encoding limit is {limit}")]
    LengthOverflow {
        field: String,
        length: usize,
        limit: usize,
    },
}

impl From<UnknownFieldError> for CodecError {
    fn from(e: UnknownFieldError) -> Self {
        Self::UnknownField(e.name)
    }
}

impl CodecError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEncoding {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn unbalanced(offset: usize, reason: impl Into<String>) -> Self {
        Self::UnbalancedNesting {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(field: &str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}
