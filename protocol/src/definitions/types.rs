//! Serialized types and field definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire type of a field. The discriminant is the protocol's type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SerializedType {
    UInt16,
    UInt32,
    UInt64,
    Hash128,
    Hash256,
    Amount,
    Blob,
    #[serde(rename = "AccountID")]
    AccountId,
    #[serde(rename = "STObject")]
    Object,
    #[serde(rename = "STArray")]
    Array,
    UInt8,
    Hash160,
    PathSet,
    Vector256,
}

impl SerializedType {
    pub const ALL: [SerializedType; 14] = [
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Hash128,
        Self::Hash256,
        Self::Amount,
        Self::Blob,
        Self::AccountId,
        Self::Object,
        Self::Array,
        Self::UInt8,
        Self::Hash160,
        Self::PathSet,
        Self::Vector256,
    ];

    /// The protocol type code.
    pub fn code(self) -> u8 {
        match self {
            Self::UInt16 => 1,
            Self::UInt32 => 2,
            Self::UInt64 => 3,
            Self::Hash128 => 4,
            Self::Hash256 => 5,
            Self::Amount => 6,
            Self::Blob => 7,
            Self::AccountId => 8,
            Self::Object => 14,
            Self::Array => 15,
            Self::UInt8 => 16,
            Self::Hash160 => 17,
            Self::PathSet => 18,
            Self::Vector256 => 19,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// The name used in `definitions.json`.
    pub fn name(self) -> &'static str {
        match self {
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Hash128 => "Hash128",
            Self::Hash256 => "Hash256",
            Self::Amount => "Amount",
            Self::Blob => "Blob",
            Self::AccountId => "AccountID",
            Self::Object => "STObject",
            Self::Array => "STArray",
            Self::UInt8 => "UInt8",
            Self::Hash160 => "Hash160",
            Self::PathSet => "PathSet",
            Self::Vector256 => "Vector256",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Byte width of fixed-size types. `None` for VL-encoded, nested and
    /// self-delimiting types.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::UInt8 => Some(1),
            Self::UInt16 => Some(2),
            Self::UInt32 => Some(4),
            Self::UInt64 => Some(8),
            Self::Hash128 => Some(16),
            Self::Hash160 => Some(20),
            Self::Hash256 => Some(32),
            _ => None,
        }
    }
}

impl fmt::Display for SerializedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: SerializedType,
    /// The field's `nth` within its type. Unique per type.
    pub field_code: u8,
    /// Payload carries a VL length prefix.
    pub is_vl_encoded: bool,
    /// Field is written to the wire at all.
    pub is_serialized: bool,
    /// Field is covered by a signature.
    pub is_signing_field: bool,
}

impl FieldDefinition {
    pub fn type_code(&self) -> u8 {
        self.field_type.code()
    }

    /// Canonical ordering key: `(type_code, field_code)`.
    pub fn sort_key(&self) -> (u8, u8) {
        (self.type_code(), self.field_code)
    }
}
