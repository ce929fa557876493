//! Bytes to object.
//!
//! The parser is iterative: open objects and arrays live on an explicit
//! frame stack rather than the call stack, so hostile input can only ever
//! cost `MAX_NESTING_DEPTH` frames.

use std::mem;

use super::amount::{Amount, Currency};
use super::error::CodecError;
use super::field_id::FieldId;
use super::length::read_length;
use super::value::{ArrayEntry, FieldValue, PathStep, TransactionObject};
use super::{
    PATH_SEPARATOR, PATH_SET_END, PATH_STEP_ACCOUNT, PATH_STEP_CURRENCY, PATH_STEP_ISSUER,
};
use crate::address::AccountId;
use crate::config::{ACCOUNT_ID_LENGTH, MAX_NESTING_DEPTH};
use crate::definitions::{FieldDefinition, FieldRegistry, SerializedType};

enum Frame {
    Object {
        /// `None` for the top-level object.
        name: Option<String>,
        fields: TransactionObject,
        last: Option<FieldId>,
        opened_at: usize,
    },
    Array {
        name: String,
        entries: Vec<ArrayEntry>,
        opened_at: usize,
    },
}

impl Frame {
    fn object(name: Option<String>, opened_at: usize) -> Self {
        Self::Object {
            name,
            fields: TransactionObject::new(),
            last: None,
            opened_at,
        }
    }
}

pub(crate) struct BinaryParser<'a> {
    registry: &'a FieldRegistry,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BinaryParser<'a> {
    pub(crate) fn new(registry: &'a FieldRegistry, bytes: &'a [u8]) -> Self {
        Self { registry, bytes, pos: 0 }
    }

    /// Parse the whole input as one top-level object.
    pub(crate) fn parse(mut self) -> Result<TransactionObject, CodecError> {
        let registry = self.registry;
        let mut stack = vec![Frame::object(None, 0)];

        while self.pos < self.bytes.len() {
            let header_at = self.pos;
            let (id, header_len) = FieldId::read(&self.bytes[self.pos..])
                .map_err(|e| CodecError::malformed(header_at, e.to_string()))?;
            self.pos += header_len;

            let field_type = SerializedType::from_code(id.type_code).ok_or_else(|| {
                CodecError::malformed(header_at, format!("unsupported type code {}", id.type_code))
            })?;

            if id.field_code == 1 && field_type == SerializedType::Object {
                close_object(&mut stack, header_at)?;
                continue;
            }
            if id.field_code == 1 && field_type == SerializedType::Array {
                close_array(&mut stack, header_at)?;
                continue;
            }

            let def = registry
                .lookup_by_id(id.type_code, id.field_code)
                .ok_or_else(|| {
                    CodecError::malformed(
                        header_at,
                        format!("unknown field id ({}, {})", id.type_code, id.field_code),
                    )
                })?;
            if !def.is_serialized {
                return Err(CodecError::malformed(
                    header_at,
                    format!("{} is never serialized", def.name),
                ));
            }

            let frame = match stack.last_mut() {
                Some(Frame::Array { name, .. }) => {
                    if field_type != SerializedType::Object {
                        return Err(CodecError::malformed(
                            header_at,
                            format!("element {} of array {} is not an object", def.name, name),
                        ));
                    }
                    Frame::object(Some(def.name.clone()), header_at)
                }
                Some(Frame::Object { fields, last, .. }) => {
                    if let Some(prev) = *last {
                        if id == prev {
                            return Err(CodecError::malformed(
                                header_at,
                                format!("duplicate field {}", def.name),
                            ));
                        }
                        if id < prev {
                            return Err(CodecError::malformed(
                                header_at,
                                format!("field {} out of canonical order", def.name),
                            ));
                        }
                    }
                    *last = Some(id);

                    match field_type {
                        SerializedType::Object => Frame::object(Some(def.name.clone()), header_at),
                        SerializedType::Array => Frame::Array {
                            name: def.name.clone(),
                            entries: Vec::new(),
                            opened_at: header_at,
                        },
                        _ => {
                            let value = self.read_value(def)?;
                            fields.insert(def.name.clone(), value);
                            continue;
                        }
                    }
                }
                None => return Err(CodecError::unbalanced(header_at, "no open object")),
            };

            stack.push(frame);
            if stack.len() - 1 > MAX_NESTING_DEPTH {
                return Err(CodecError::NestingTooDeep {
                    offset: header_at,
                    limit: MAX_NESTING_DEPTH,
                });
            }
        }

        if stack.len() > 1 {
            let reason = match stack.last() {
                Some(Frame::Object { name, opened_at, .. }) => format!(
                    "object {} opened at byte {} is never closed",
                    name.as_deref().unwrap_or("?"),
                    opened_at
                ),
                Some(Frame::Array { name, opened_at, .. }) => {
                    format!("array {} opened at byte {} is never closed", name, opened_at)
                }
                None => String::new(),
            };
            return Err(CodecError::unbalanced(self.pos, reason));
        }
        match stack.pop() {
            Some(Frame::Object { fields, .. }) => Ok(fields),
            _ => Err(CodecError::unbalanced(self.pos, "top level is not an object")),
        }
    }

    /// Read a non-container value for `def` at the current position.
    fn read_value(&mut self, def: &FieldDefinition) -> Result<FieldValue, CodecError> {
        let start = self.pos;
        let value = match def.field_type {
            SerializedType::UInt8 => FieldValue::UInt8(self.take_array::<1>()?[0]),
            SerializedType::UInt16 => FieldValue::UInt16(u16::from_be_bytes(self.take_array()?)),
            SerializedType::UInt32 => FieldValue::UInt32(u32::from_be_bytes(self.take_array()?)),
            SerializedType::UInt64 => FieldValue::UInt64(u64::from_be_bytes(self.take_array()?)),
            SerializedType::Hash128 => FieldValue::Hash128(self.take_array()?),
            SerializedType::Hash160 => FieldValue::Hash160(self.take_array()?),
            SerializedType::Hash256 => FieldValue::Hash256(self.take_array()?),
            SerializedType::Amount => {
                let (amount, used) = Amount::from_bytes(&self.bytes[self.pos..])
                    .map_err(|e| CodecError::malformed(start, format!("{}: {}", def.name, e)))?;
                self.pos += used;
                FieldValue::Amount(amount)
            }
            SerializedType::Blob => FieldValue::Blob(self.read_vl()?.to_vec()),
            SerializedType::AccountId => {
                let bytes = self.read_vl()?;
                let id = AccountId::try_from_slice(bytes)
                    .map_err(|e| CodecError::malformed(start, format!("{}: {}", def.name, e)))?;
                FieldValue::AccountId(id)
            }
            SerializedType::Vector256 => {
                let bytes = self.read_vl()?;
                if bytes.len() % 32 != 0 {
                    return Err(CodecError::malformed(
                        start,
                        format!("{} length {} is not a multiple of 32", def.name, bytes.len()),
                    ));
                }
                let hashes = bytes
                    .chunks_exact(32)
                    .map(|chunk| {
                        let mut hash = [0u8; 32];
                        hash.copy_from_slice(chunk);
                        hash
                    })
                    .collect();
                FieldValue::Vector256(hashes)
            }
            SerializedType::PathSet => FieldValue::PathSet(self.read_path_set()?),
            SerializedType::Object | SerializedType::Array => {
                return Err(CodecError::malformed(start, "container read as a value"));
            }
        };
        Ok(value)
    }

    fn read_path_set(&mut self) -> Result<Vec<Vec<PathStep>>, CodecError> {
        let mut paths = Vec::new();
        let mut current: Vec<PathStep> = Vec::new();
        loop {
            let at = self.pos;
            let flags = self.take_array::<1>()?[0];
            match flags {
                PATH_SET_END => {
                    if !current.is_empty() {
                        paths.push(current);
                    } else if !paths.is_empty() {
                        return Err(CodecError::malformed(at, "path set ends with an empty path"));
                    }
                    return Ok(paths);
                }
                PATH_SEPARATOR => {
                    if current.is_empty() {
                        return Err(CodecError::malformed(at, "empty path in path set"));
                    }
                    paths.push(mem::take(&mut current));
                }
                _ => {
                    let known = PATH_STEP_ACCOUNT | PATH_STEP_CURRENCY | PATH_STEP_ISSUER;
                    if flags & !known != 0 {
                        return Err(CodecError::malformed(at, format!("unknown path step flags {:#04x}", flags)));
                    }
                    let mut step = PathStep::default();
                    if flags & PATH_STEP_ACCOUNT != 0 {
                        step.account = Some(AccountId::from_bytes(self.take_array::<ACCOUNT_ID_LENGTH>()?));
                    }
                    if flags & PATH_STEP_CURRENCY != 0 {
                        step.currency = Some(Currency::from_bytes(self.take_array()?));
                    }
                    if flags & PATH_STEP_ISSUER != 0 {
                        step.issuer = Some(AccountId::from_bytes(self.take_array::<ACCOUNT_ID_LENGTH>()?));
                    }
                    current.push(step);
                }
            }
        }
    }

    fn read_vl(&mut self) -> Result<&'a [u8], CodecError> {
        let at = self.pos;
        let (length, prefix_len) =
            read_length(&self.bytes[self.pos..]).map_err(|e| CodecError::malformed(at, e.to_string()))?;
        self.pos += prefix_len;
        self.take(length)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let bytes: &'a [u8] = self.bytes;
        let slice = self
            .pos
            .checked_add(n)
            .and_then(|end| bytes.get(self.pos..end))
            .ok_or_else(|| {
                CodecError::malformed(
                    self.pos,
                    format!("needed {} bytes, {} left", n, bytes.len() - self.pos),
                )
            })?;
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

fn close_object(stack: &mut Vec<Frame>, at: usize) -> Result<(), CodecError> {
    let (name, fields) = match stack.pop() {
        Some(Frame::Object { name: Some(name), fields, .. }) => (name, fields),
        Some(Frame::Array { name, .. }) => {
            return Err(CodecError::unbalanced(
                at,
                format!("object end marker inside array {}", name),
            ))
        }
        _ => return Err(CodecError::unbalanced(at, "object end marker outside any object")),
    };
    match stack.last_mut() {
        Some(Frame::Array { entries, .. }) => entries.push(ArrayEntry::new(name, fields)),
        Some(Frame::Object { fields: parent, .. }) => {
            parent.insert(name, FieldValue::Object(fields));
        }
        None => return Err(CodecError::unbalanced(at, "object closed with no parent")),
    }
    Ok(())
}

fn close_array(stack: &mut Vec<Frame>, at: usize) -> Result<(), CodecError> {
    let (name, entries) = match stack.pop() {
        Some(Frame::Array { name, entries, .. }) => (name, entries),
        Some(Frame::Object { name, .. }) => {
            return Err(CodecError::unbalanced(
                at,
                format!(
                    "array end marker inside object {}",
                    name.as_deref().unwrap_or("(top level)")
                ),
            ))
        }
        None => return Err(CodecError::unbalanced(at, "array end marker with nothing open")),
    };
    match stack.last_mut() {
        Some(Frame::Object { fields, .. }) => {
            fields.insert(name, FieldValue::Array(entries));
            Ok(())
        }
        _ => Err(CodecError::unbalanced(at, "array closed outside an object")),
    }
}
