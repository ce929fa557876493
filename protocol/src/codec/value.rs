//! In-memory transactions: named fields holding typed values.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use super::amount::{Amount, Currency};
use crate::address::AccountId;
use crate::definitions::SerializedType;

/// One hop in a payment path. At least one part is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub account: Option<AccountId>,
    pub currency: Option<Currency>,
    pub issuer: Option<AccountId>,
}

/// An element of an `STArray`: the wrapper field name and its object, as in
/// `{"Memo": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayEntry {
    pub name: String,
    pub object: TransactionObject,
}

impl ArrayEntry {
    pub fn new(name: impl Into<String>, object: TransactionObject) -> Self {
        Self {
            name: name.into(),
            object,
        }
    }
}

/// A field value. The variant must match the field's registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Hash128([u8; 16]),
    Hash160([u8; 20]),
    Hash256([u8; 32]),
    Amount(Amount),
    Blob(Vec<u8>),
    AccountId(AccountId),
    Object(TransactionObject),
    Array(Vec<ArrayEntry>),
    PathSet(Vec<Vec<PathStep>>),
    Vector256(Vec<[u8; 32]>),
}

impl FieldValue {
    /// The wire type this value serializes as.
    pub fn serialized_type(&self) -> SerializedType {
        match self {
            Self::UInt8(_) => SerializedType::UInt8,
            Self::UInt16(_) => SerializedType::UInt16,
            Self::UInt32(_) => SerializedType::UInt32,
            Self::UInt64(_) => SerializedType::UInt64,
            Self::Hash128(_) => SerializedType::Hash128,
            Self::Hash160(_) => SerializedType::Hash160,
            Self::Hash256(_) => SerializedType::Hash256,
            Self::Amount(_) => SerializedType::Amount,
            Self::Blob(_) => SerializedType::Blob,
            Self::AccountId(_) => SerializedType::AccountId,
            Self::Object(_) => SerializedType::Object,
            Self::Array(_) => SerializedType::Array,
            Self::PathSet(_) => SerializedType::PathSet,
            Self::Vector256(_) => SerializedType::Vector256,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    [u8; 16] => Hash128,
    [u8; 20] => Hash160,
    [u8; 32] => Hash256,
    Amount => Amount,
    Vec<u8> => Blob,
    AccountId => AccountId,
    TransactionObject => Object,
    Vec<ArrayEntry> => Array,
    Vec<[u8; 32]> => Vector256,
}

/// A transaction, or any nested object: field name to value.
///
/// Iteration order is alphabetical, not canonical. The codec sorts fields
/// into canonical order when it writes them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TransactionObject(BTreeMap<String, FieldValue>);

impl TransactionObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.0.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get_u16(&self, name: &str) -> Option<u16> {
        match self.get(name)? {
            FieldValue::UInt16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            FieldValue::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_blob(&self, name: &str) -> Option<&[u8]> {
        match self.get(name)? {
            FieldValue::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_account(&self, name: &str) -> Option<AccountId> {
        match self.get(name)? {
            FieldValue::AccountId(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_amount(&self, name: &str) -> Option<&Amount> {
        match self.get(name)? {
            FieldValue::Amount(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_array(&self, name: &str) -> Option<&[ArrayEntry]> {
        match self.get(name)? {
            FieldValue::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Debug for TransactionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for TransactionObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for TransactionObject {
    type Item = (String, FieldValue);
    type IntoIter = btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TransactionObject {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
