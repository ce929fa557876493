//! Object to bytes.

use super::error::CodecError;
use super::field_id::FieldId;
use super::length::write_length;
use super::value::{FieldValue, PathStep, TransactionObject};
use super::{
    ARRAY_END_MARKER, OBJECT_END_MARKER, PATH_SEPARATOR, PATH_SET_END, PATH_STEP_ACCOUNT,
    PATH_STEP_CURRENCY, PATH_STEP_ISSUER,
};
use crate::config::{MAX_NESTING_DEPTH, VL_THREE_BYTE_MAX};
use crate::definitions::{FieldDefinition, FieldRegistry, SerializedType};

/// Accumulates the canonical encoding of one object tree.
///
/// Output is only handed out by [`BinarySerializer::into_bytes`], so a
/// failed write never leaks a partial encoding.
pub(crate) struct BinarySerializer<'r> {
    registry: &'r FieldRegistry,
    out: Vec<u8>,
}

impl<'r> BinarySerializer<'r> {
    pub(crate) fn new(registry: &'r FieldRegistry) -> Self {
        Self {
            registry,
            out: Vec::with_capacity(256),
        }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    /// Write a top-level object. No end marker follows it.
    ///
    /// With `signing_fields_only`, top-level fields not covered by
    /// signatures are skipped. Nested objects are always written whole.
    pub(crate) fn write_root(
        &mut self,
        obj: &TransactionObject,
        signing_fields_only: bool,
    ) -> Result<(), CodecError> {
        self.write_fields(obj, signing_fields_only, 0)
    }

    fn write_fields(
        &mut self,
        obj: &TransactionObject,
        signing_fields_only: bool,
        depth: usize,
    ) -> Result<(), CodecError> {
        let mut fields = Vec::with_capacity(obj.len());
        for (name, value) in obj {
            let def = self.registry.lookup(name)?;
            if !def.is_serialized || (signing_fields_only && !def.is_signing_field) {
                continue;
            }
            if is_end_marker(def) {
                return Err(CodecError::invalid_value(name, "end markers are written by the codec"));
            }
            fields.push((def, value));
        }
        fields.sort_by_key(|(def, _)| def.sort_key());

        for (def, value) in fields {
            self.write_field(def, value, depth)?;
        }
        Ok(())
    }

    fn write_field(&mut self, def: &FieldDefinition, value: &FieldValue, depth: usize) -> Result<(), CodecError> {
        if value.serialized_type() != def.field_type {
            return Err(CodecError::TypeMismatch {
                field: def.name.clone(),
                expected: def.field_type,
            });
        }
        FieldId::new(def.type_code(), def.field_code).write(&mut self.out);

        match value {
            FieldValue::UInt8(v) => self.out.push(*v),
            FieldValue::UInt16(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            FieldValue::UInt32(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            FieldValue::UInt64(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            FieldValue::Hash128(h) => self.out.extend_from_slice(h),
            FieldValue::Hash160(h) => self.out.extend_from_slice(h),
            FieldValue::Hash256(h) => self.out.extend_from_slice(h),
            FieldValue::Amount(amount) => {
                let bytes = amount
                    .to_bytes()
                    .map_err(|e| CodecError::invalid_value(&def.name, e))?;
                self.out.extend_from_slice(&bytes);
            }
            FieldValue::Blob(bytes) => self.write_vl(&def.name, bytes)?,
            FieldValue::AccountId(id) => self.write_vl(&def.name, id.as_bytes())?,
            FieldValue::Object(inner) => self.write_object(inner, depth + 1)?,
            FieldValue::Array(entries) => {
                self.check_depth(depth + 1)?;
                for entry in entries {
                    let entry_def = self.registry.lookup(&entry.name)?;
                    if entry_def.field_type != SerializedType::Object || is_end_marker(entry_def) {
                        return Err(CodecError::TypeMismatch {
                            field: entry.name.clone(),
                            expected: SerializedType::Object,
                        });
                    }
                    FieldId::new(entry_def.type_code(), entry_def.field_code).write(&mut self.out);
                    self.write_object(&entry.object, depth + 2)?;
                }
                self.out.push(ARRAY_END_MARKER);
            }
            FieldValue::PathSet(paths) => self.write_path_set(&def.name, paths)?,
            FieldValue::Vector256(hashes) => {
                let joined: Vec<u8> = hashes.iter().flatten().copied().collect();
                self.write_vl(&def.name, &joined)?;
            }
        }
        Ok(())
    }

    fn write_object(&mut self, obj: &TransactionObject, depth: usize) -> Result<(), CodecError> {
        self.check_depth(depth)?;
        self.write_fields(obj, false, depth)?;
        self.out.push(OBJECT_END_MARKER);
        Ok(())
    }

    fn write_vl(&mut self, field: &str, bytes: &[u8]) -> Result<(), CodecError> {
        write_length(&mut self.out, bytes.len()).map_err(|_| CodecError::LengthOverflow {
            field: field.to_string(),
            length: bytes.len(),
            limit: VL_THREE_BYTE_MAX,
        })?;
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    fn write_path_set(&mut self, field: &str, paths: &[Vec<PathStep>]) -> Result<(), CodecError> {
        for (i, path) in paths.iter().enumerate() {
            if path.is_empty() {
                return Err(CodecError::invalid_value(field, format!("path {} is empty", i)));
            }
            if i > 0 {
                self.out.push(PATH_SEPARATOR);
            }
            for step in path {
                let mut flags = 0u8;
                if step.account.is_some() {
                    flags |= PATH_STEP_ACCOUNT;
                }
                if step.currency.is_some() {
                    flags |= PATH_STEP_CURRENCY;
                }
                if step.issuer.is_some() {
                    flags |= PATH_STEP_ISSUER;
                }
                if flags == 0 {
                    return Err(CodecError::invalid_value(field, format!("path {} has an empty step", i)));
                }
                self.out.push(flags);
                if let Some(account) = &step.account {
                    self.out.extend_from_slice(account.as_bytes());
                }
                if let Some(currency) = &step.currency {
                    self.out.extend_from_slice(currency.as_bytes());
                }
                if let Some(issuer) = &step.issuer {
                    self.out.extend_from_slice(issuer.as_bytes());
                }
            }
        }
        self.out.push(PATH_SET_END);
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), CodecError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CodecError::NestingTooDeep {
                offset: self.out.len(),
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }
}

/// `ObjectEndMarker` and `ArrayEndMarker` are code 1 of their types.
pub(crate) fn is_end_marker(def: &FieldDefinition) -> bool {
    matches!(def.field_type, SerializedType::Object | SerializedType::Array) && def.field_code == 1
}
