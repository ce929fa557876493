//! # Field Schema Registry
//!
//! Every field that can appear in a transaction has a row in
//! `definitions.json`: its wire type, its code within that type, and three
//! flags (VL-encoded, serialized, covered by signatures). The codec never
//! hardcodes a field; it asks the registry.
//!
//! The table is parsed once, on first use, into a process-wide read-only
//! [`FieldRegistry`]. After that it is shared across threads without locks.
//!
//! ## Canonical order
//!
//! Fields are always written sorted by `(type_code, field_code)`. Two
//! implementations that agree on this table agree on every byte, which is
//! what makes signatures portable.

mod registry;
mod types;

pub use registry::{DefinitionsError, FieldRegistry, UnknownFieldError};
pub use types::{FieldDefinition, SerializedType};

/// Look up a field by name in the global registry.
pub fn lookup(name: &str) -> Result<&'static FieldDefinition, UnknownFieldError> {
    FieldRegistry::global().lookup(name)
}

/// Look up a field by its `(type_code, field_code)` pair.
pub fn lookup_by_id(type_code: u8, field_code: u8) -> Option<&'static FieldDefinition> {
    FieldRegistry::global().lookup_by_id(type_code, field_code)
}

/// Resolve and sort field names into canonical order.
pub fn canonical_order<I, S>(names: I) -> Result<Vec<&'static FieldDefinition>, UnknownFieldError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    FieldRegistry::global().canonical_order(names)
}

pub fn transaction_type_code(name: &str) -> Option<u16> {
    FieldRegistry::global().transaction_type_code(name)
}

pub fn transaction_type_name(code: u16) -> Option<&'static str> {
    FieldRegistry::global().transaction_type_name(code)
}
