//! Loading and indexing the field table.

use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::types::{FieldDefinition, SerializedType};

/// The field table compiled into the binary.
const EMBEDDED_DEFINITIONS: &str = include_str!("definitions.json");

/// A field name the registry does not know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown field: {name}")]
pub struct UnknownFieldError {
    pub name: String,
}

/// Problems with a definitions document. Any of these makes the table
/// unusable.
#[derive(Debug, Error)]
pub enum DefinitionsError {
    #[error("definitions are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field {field} has unknown type {type_name}")]
    UnknownType { field: String, type_name: String },

    #[error("type {name} declared with code {got}, expected {expected}")]
    TypeCodeMismatch { name: String, expected: u8, got: i64 },

    #[error("field {name} has out-of-range code {nth}")]
    FieldCodeOutOfRange { name: String, nth: i64 },

    #[error("field name {0} defined twice")]
    DuplicateFieldName(String),

    #[error("fields {first} and {second} share id ({type_code}, {field_code})")]
    DuplicateFieldId {
        first: String,
        second: String,
        type_code: u8,
        field_code: u8,
    },

    #[error("transaction type {name} has out-of-range code {code}")]
    TransactionCodeOutOfRange { name: String, code: i64 },

    #[error("transaction code {code} used by both {first} and {second}")]
    DuplicateTransactionCode { code: u16, first: String, second: String },

    #[error("format for unknown transaction type {0}")]
    UnknownFormatType(String),

    #[error("format for {tx_type} names unknown field {field}")]
    UnknownFormatField { tx_type: String, field: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawDefinitions {
    types: BTreeMap<String, i64>,
    fields: Vec<(String, RawField)>,
    transaction_types: BTreeMap<String, i64>,
    #[serde(default)]
    common_required_fields: Vec<String>,
    #[serde(default)]
    transaction_formats: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    nth: i64,
    #[serde(rename = "isVLEncoded")]
    is_vl_encoded: bool,
    is_serialized: bool,
    is_signing_field: bool,
    #[serde(rename = "type")]
    type_name: String,
}

/// Read-only index over the field and transaction-type tables.
///
/// Fields are stored in canonical order, so iterating [`FieldRegistry::fields`]
/// yields them sorted by `(type_code, field_code)`.
#[derive(Debug)]
pub struct FieldRegistry {
    fields: Vec<FieldDefinition>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<(u8, u8), usize>,
    transaction_codes: BTreeMap<String, u16>,
    transaction_names: HashMap<u16, String>,
    common_required: Vec<String>,
    formats: HashMap<String, Vec<String>>,
}

lazy_static! {
    static ref GLOBAL: FieldRegistry = match FieldRegistry::from_json(EMBEDDED_DEFINITIONS) {
        Ok(registry) => registry,
        Err(e) => panic!("embedded field definitions are invalid: {e}"),
    };
}

impl FieldRegistry {
    /// The process-wide registry built from the embedded table.
    ///
    /// # Panics
    ///
    /// On first use, if the embedded table is inconsistent. That is a build
    /// defect, caught by this module's tests.
    pub fn global() -> &'static FieldRegistry {
        &GLOBAL
    }

    /// Build a registry from a definitions document.
    pub fn from_json(json: &str) -> Result<Self, DefinitionsError> {
        let raw: RawDefinitions = serde_json::from_str(json)?;

        for (name, &code) in &raw.types {
            if let Some(ty) = SerializedType::from_name(name) {
                if i64::from(ty.code()) != code {
                    return Err(DefinitionsError::TypeCodeMismatch {
                        name: name.clone(),
                        expected: ty.code(),
                        got: code,
                    });
                }
            }
        }

        let mut fields = Vec::with_capacity(raw.fields.len());
        for (name, f) in raw.fields {
            let field_type = raw
                .types
                .get(&f.type_name)
                .and_then(|_| SerializedType::from_name(&f.type_name))
                .ok_or_else(|| DefinitionsError::UnknownType {
                    field: name.clone(),
                    type_name: f.type_name.clone(),
                })?;
            let field_code = u8::try_from(f.nth)
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| DefinitionsError::FieldCodeOutOfRange {
                    name: name.clone(),
                    nth: f.nth,
                })?;
            fields.push(FieldDefinition {
                name,
                field_type,
                field_code,
                is_vl_encoded: f.is_vl_encoded,
                is_serialized: f.is_serialized,
                is_signing_field: f.is_signing_field,
            });
        }
        fields.sort_by_key(FieldDefinition::sort_key);

        let mut by_name = HashMap::with_capacity(fields.len());
        let mut by_id: HashMap<(u8, u8), usize> = HashMap::with_capacity(fields.len());
        for (i, def) in fields.iter().enumerate() {
            if by_name.insert(def.name.clone(), i).is_some() {
                return Err(DefinitionsError::DuplicateFieldName(def.name.clone()));
            }
            if let Some(&prev) = by_id.get(&def.sort_key()) {
                return Err(DefinitionsError::DuplicateFieldId {
                    first: fields[prev].name.clone(),
                    second: def.name.clone(),
                    type_code: def.type_code(),
                    field_code: def.field_code,
                });
            }
            by_id.insert(def.sort_key(), i);
        }

        // Negative codes mark pseudo-types such as "Invalid"; they never
        // appear on the wire.
        let mut transaction_codes = BTreeMap::new();
        let mut transaction_names: HashMap<u16, String> = HashMap::new();
        for (name, code) in raw.transaction_types {
            if code < 0 {
                continue;
            }
            let code = u16::try_from(code).map_err(|_| DefinitionsError::TransactionCodeOutOfRange {
                name: name.clone(),
                code,
            })?;
            if let Some(first) = transaction_names.get(&code) {
                return Err(DefinitionsError::DuplicateTransactionCode {
                    code,
                    first: first.clone(),
                    second: name,
                });
            }
            transaction_names.insert(code, name.clone());
            transaction_codes.insert(name, code);
        }

        let known_field = |tx_type: &str, field: &str| {
            if by_name.contains_key(field) {
                Ok(())
            } else {
                Err(DefinitionsError::UnknownFormatField {
                    tx_type: tx_type.to_string(),
                    field: field.to_string(),
                })
            }
        };
        for field in &raw.common_required_fields {
            known_field("*", field)?;
        }
        let mut formats = HashMap::with_capacity(raw.transaction_formats.len());
        for (tx_type, required) in raw.transaction_formats {
            if !transaction_codes.contains_key(&tx_type) {
                return Err(DefinitionsError::UnknownFormatType(tx_type));
            }
            for field in &required {
                known_field(&tx_type, field)?;
            }
            formats.insert(tx_type, required);
        }

        tracing::debug!(
            fields = fields.len(),
            transaction_types = transaction_codes.len(),
            "loaded field definitions"
        );

        Ok(Self {
            fields,
            by_name,
            by_id,
            transaction_codes,
            transaction_names,
            common_required: raw.common_required_fields,
            formats,
        })
    }

    pub fn lookup(&self, name: &str) -> Result<&FieldDefinition, UnknownFieldError> {
        self.by_name
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| UnknownFieldError { name: name.to_string() })
    }

    pub fn lookup_by_id(&self, type_code: u8, field_code: u8) -> Option<&FieldDefinition> {
        self.by_id.get(&(type_code, field_code)).map(|&i| &self.fields[i])
    }

    /// Resolve `names` and sort them into canonical order. Fails on the
    /// first unknown name.
    pub fn canonical_order<I, S>(&self, names: I) -> Result<Vec<&FieldDefinition>, UnknownFieldError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut defs = names
            .into_iter()
            .map(|name| self.lookup(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        defs.sort_by_key(|d| d.sort_key());
        Ok(defs)
    }

    /// All fields, in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    pub fn transaction_type_code(&self, name: &str) -> Option<u16> {
        self.transaction_codes.get(name).copied()
    }

    pub fn transaction_type_name(&self, code: u16) -> Option<&str> {
        self.transaction_names.get(&code).map(String::as_str)
    }

    /// Names of all known transaction types, alphabetically.
    pub fn transaction_types(&self) -> impl Iterator<Item = &str> {
        self.transaction_codes.keys().map(String::as_str)
    }

    /// Fields every transaction must carry.
    pub fn common_required_fields(&self) -> &[String] {
        &self.common_required
    }

    /// Type-specific required fields, if the table has a format for `tx_type`.
    pub fn transaction_format(&self, tx_type: &str) -> Option<&[String]> {
        self.formats.get(tx_type).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> &'static FieldRegistry {
        FieldRegistry::global()
    }

    #[test]
    fn embedded_table_loads() {
        let reg = registry();
        assert!(reg.fields().count() > 90);
        assert_eq!(reg.common_required_fields(), ["Account", "Fee", "Sequence"]);
    }

    #[test]
    fn lookup_known_fields() {
        let reg = registry();
        let fee = reg.lookup("Fee").unwrap();
        assert_eq!(fee.field_type, SerializedType::Amount);
        assert_eq!(fee.field_code, 8);

        let sig = reg.lookup("TxnSignature").unwrap();
        assert!(sig.is_vl_encoded);
        assert!(!sig.is_signing_field);

        assert_eq!(
            reg.lookup("NotAField"),
            Err(UnknownFieldError { name: "NotAField".into() })
        );
    }

    #[test]
    fn lookup_by_id_matches_lookup_by_name() {
        let reg = registry();
        for def in reg.fields() {
            assert_eq!(reg.lookup_by_id(def.type_code(), def.field_code), Some(def));
            assert_eq!(reg.lookup(&def.name).unwrap(), def);
        }
        assert!(reg.lookup_by_id(2, 200).is_none());
    }

    #[test]
    fn canonical_order_sorts_by_type_then_field() {
        let reg = registry();
        let ordered = reg
            .canonical_order(["Account", "Fee", "TransactionType", "Sequence", "Flags"])
            .unwrap();
        let names: Vec<&str> = ordered.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["TransactionType", "Flags", "Sequence", "Fee", "Account"]);
    }

    #[test]
    fn canonical_order_reports_unknown_name() {
        let err = registry().canonical_order(["Fee", "Bogus"]).unwrap_err();
        assert_eq!(err.name, "Bogus");
    }

    #[test]
    fn fields_iterate_in_canonical_order() {
        let keys: Vec<(u8, u8)> = registry().fields().map(|d| d.sort_key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn transaction_type_mapping() {
        let reg = registry();
        assert_eq!(reg.transaction_type_code("Payment"), Some(0));
        assert_eq!(reg.transaction_type_code("TrustSet"), Some(20));
        assert_eq!(reg.transaction_type_name(7), Some("OfferCreate"));
        assert_eq!(reg.transaction_type_name(999), None);
        assert_eq!(reg.transaction_format("Payment").unwrap(), ["Amount", "Destination"]);
    }

    #[test]
    fn duplicate_field_id_is_rejected() {
        let json = r#"{
            "TYPES": {"UInt32": 2},
            "FIELDS": [
                ["Flags", {"nth": 2, "isVLEncoded": false, "isSerialized": true, "isSigningField": true, "type": "UInt32"}],
                ["Flags2", {"nth": 2, "isVLEncoded": false, "isSerialized": true, "isSigningField": true, "type": "UInt32"}]
            ],
            "TRANSACTION_TYPES": {}
        }"#;
        let err = FieldRegistry::from_json(json).unwrap_err();
        assert!(matches!(err, DefinitionsError::DuplicateFieldId { type_code: 2, field_code: 2, .. }));
    }

    #[test]
    fn wrong_type_code_is_rejected() {
        let json = r#"{"TYPES": {"UInt32": 3}, "FIELDS": [], "TRANSACTION_TYPES": {}}"#;
        let err = FieldRegistry::from_json(json).unwrap_err();
        assert!(matches!(err, DefinitionsError::TypeCodeMismatch { expected: 2, got: 3, .. }));
    }

    #[test]
    fn unknown_field_type_is_rejected() {
        let json = r#"{
            "TYPES": {},
            "FIELDS": [["X", {"nth": 1, "isVLEncoded": false, "isSerialized": true, "isSigningField": true, "type": "Number"}]],
            "TRANSACTION_TYPES": {}
        }"#;
        assert!(matches!(
            FieldRegistry::from_json(json).unwrap_err(),
            DefinitionsError::UnknownType { .. }
        ));
    }

    #[test]
    fn format_must_reference_known_fields() {
        let json = r#"{
            "TYPES": {},
            "FIELDS": [],
            "TRANSACTION_TYPES": {"Payment": 0, "Invalid": -1},
            "TRANSACTION_FORMATS": {"Payment": ["Amount"]}
        }"#;
        assert!(matches!(
            FieldRegistry::from_json(json).unwrap_err(),
            DefinitionsError::UnknownFormatField { .. }
        ));
    }

    #[test]
    fn vl_flag_matches_type() {
        for def in registry().fields() {
            let expected = matches!(
                def.field_type,
                SerializedType::Blob | SerializedType::AccountId | SerializedType::Vector256
            );
            assert_eq!(def.is_vl_encoded, expected, "{}", def.name);
        }
    }
}
