//! JSON form of transactions.
//!
//! Follows the conventions of the ledger's RPC interface:
//!
//! - `TransactionType` as its name, other small integers as numbers
//! - `UInt64` as 16 uppercase hex digits
//! - hashes and blobs as uppercase hex
//! - accounts as `r…` addresses
//! - native amounts as a string of drops, issued amounts as
//!   `{"currency", "issuer", "value"}`
//! - array elements as single-key wrapper objects: `{"Memo": {...}}`

use serde_json::{json, Map, Value};

use super::amount::{Amount, Currency, IouValue, IssuedAmount};
use super::error::CodecError;
use super::value::{ArrayEntry, FieldValue, PathStep, TransactionObject};
use crate::address::AccountId;
use crate::config::MAX_NESTING_DEPTH;
use crate::definitions::{self, FieldDefinition, FieldRegistry, SerializedType};

const TRANSACTION_TYPE_FIELD: &str = "TransactionType";

/// Render an object as JSON.
pub fn to_json(obj: &TransactionObject) -> Value {
    Value::Object(object_to_map(obj))
}

fn object_to_map(obj: &TransactionObject) -> Map<String, Value> {
    obj.iter()
        .map(|(name, value)| (name.clone(), value_to_json(name, value)))
        .collect()
}

fn value_to_json(name: &str, value: &FieldValue) -> Value {
    match value {
        FieldValue::UInt16(code) if name == TRANSACTION_TYPE_FIELD => {
            match definitions::transaction_type_name(*code) {
                Some(type_name) => Value::String(type_name.to_string()),
                None => json!(code),
            }
        }
        FieldValue::UInt8(v) => json!(v),
        FieldValue::UInt16(v) => json!(v),
        FieldValue::UInt32(v) => json!(v),
        FieldValue::UInt64(v) => Value::String(format!("{:016X}", v)),
        FieldValue::Hash128(h) => Value::String(hex::encode_upper(h)),
        FieldValue::Hash160(h) => Value::String(hex::encode_upper(h)),
        FieldValue::Hash256(h) => Value::String(hex::encode_upper(h)),
        FieldValue::Amount(amount) => amount_to_json(amount),
        FieldValue::Blob(b) => Value::String(hex::encode_upper(b)),
        FieldValue::AccountId(id) => Value::String(id.to_address()),
        FieldValue::Object(inner) => to_json(inner),
        FieldValue::Array(entries) => Value::Array(
            entries
                .iter()
                .map(|entry| {
                    let mut wrapper = Map::new();
                    wrapper.insert(entry.name.clone(), to_json(&entry.object));
                    Value::Object(wrapper)
                })
                .collect(),
        ),
        FieldValue::PathSet(paths) => Value::Array(
            paths
                .iter()
                .map(|path| Value::Array(path.iter().map(path_step_to_json).collect()))
                .collect(),
        ),
        FieldValue::Vector256(hashes) => Value::Array(
            hashes
                .iter()
                .map(|h| Value::String(hex::encode_upper(h)))
                .collect(),
        ),
    }
}

fn amount_to_json(amount: &Amount) -> Value {
    match amount {
        Amount::Native(drops) => Value::String(drops.to_string()),
        Amount::Issued(issued) => json!({
            "currency": issued.currency.to_string(),
            "issuer": issued.issuer.to_address(),
            "value": issued.value.to_string(),
        }),
    }
}

fn path_step_to_json(step: &PathStep) -> Value {
    let mut map = Map::new();
    if let Some(account) = &step.account {
        map.insert("account".into(), Value::String(account.to_address()));
    }
    if let Some(currency) = &step.currency {
        map.insert("currency".into(), Value::String(currency.to_string()));
    }
    if let Some(issuer) = &step.issuer {
        map.insert("issuer".into(), Value::String(issuer.to_address()));
    }
    Value::Object(map)
}

/// Parse the JSON form of an object.
///
/// # Errors
///
/// [`CodecError::UnknownField`] for names not in the registry,
/// [`CodecError::TypeMismatch`] when the JSON shape does not fit the
/// field's type, [`CodecError::InvalidValue`] for well-shaped but
/// unrepresentable values.
pub fn from_json(value: &Value) -> Result<TransactionObject, CodecError> {
    let parser = JsonParser {
        registry: FieldRegistry::global(),
    };
    parser.object("(top level)", value, 0)
}

struct JsonParser {
    registry: &'static FieldRegistry,
}

impl JsonParser {
    fn object(&self, name: &str, value: &Value, depth: usize) -> Result<TransactionObject, CodecError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CodecError::NestingTooDeep {
                offset: 0,
                limit: MAX_NESTING_DEPTH,
            });
        }
        let map = value
            .as_object()
            .ok_or_else(|| CodecError::invalid_value(name, "expected a JSON object"))?;
        let mut obj = TransactionObject::new();
        for (field, v) in map {
            let def = self.registry.lookup(field)?;
            obj.insert(field.clone(), self.field(def, v, depth)?);
        }
        Ok(obj)
    }

    fn field(&self, def: &FieldDefinition, v: &Value, depth: usize) -> Result<FieldValue, CodecError> {
        let name = def.name.as_str();
        let mismatch = || CodecError::TypeMismatch {
            field: def.name.clone(),
            expected: def.field_type,
        };

        let value = match def.field_type {
            SerializedType::UInt8 => FieldValue::UInt8(uint(name, v)?),
            SerializedType::UInt16 => match v {
                Value::String(s) if name == TRANSACTION_TYPE_FIELD => {
                    let code = self.registry.transaction_type_code(s).ok_or_else(|| {
                        CodecError::invalid_value(name, format!("unknown transaction type {}", s))
                    })?;
                    FieldValue::UInt16(code)
                }
                _ => FieldValue::UInt16(uint(name, v)?),
            },
            SerializedType::UInt32 => FieldValue::UInt32(uint(name, v)?),
            SerializedType::UInt64 => match v {
                Value::String(s) => {
                    if s.is_empty() || s.len() > 16 {
                        return Err(CodecError::invalid_value(name, "expected 1 to 16 hex digits"));
                    }
                    let n = u64::from_str_radix(s, 16).map_err(|e| CodecError::invalid_value(name, e))?;
                    FieldValue::UInt64(n)
                }
                _ => FieldValue::UInt64(uint(name, v)?),
            },
            SerializedType::Hash128 => FieldValue::Hash128(fixed_hex(name, v)?),
            SerializedType::Hash160 => FieldValue::Hash160(fixed_hex(name, v)?),
            SerializedType::Hash256 => FieldValue::Hash256(fixed_hex(name, v)?),
            SerializedType::Amount => FieldValue::Amount(amount(name, v)?),
            SerializedType::Blob => {
                let s = v.as_str().ok_or_else(mismatch)?;
                FieldValue::Blob(hex::decode(s).map_err(|e| CodecError::invalid_value(name, e))?)
            }
            SerializedType::AccountId => FieldValue::AccountId(account(name, v)?),
            SerializedType::Object => FieldValue::Object(self.object(name, v, depth + 1)?),
            SerializedType::Array => {
                let items = v.as_array().ok_or_else(mismatch)?;
                let mut entries = Vec::with_capacity(items.len());
                for item in items {
                    let wrapper = item
                        .as_object()
                        .filter(|m| m.len() == 1)
                        .ok_or_else(|| CodecError::invalid_value(name, "array elements must be single-key objects"))?;
                    for (entry_name, inner) in wrapper {
                        entries.push(ArrayEntry::new(
                            entry_name.clone(),
                            self.object(entry_name, inner, depth + 2)?,
                        ));
                    }
                }
                FieldValue::Array(entries)
            }
            SerializedType::PathSet => {
                let paths = v.as_array().ok_or_else(mismatch)?;
                let mut out = Vec::with_capacity(paths.len());
                for path in paths {
                    let steps = path.as_array().ok_or_else(mismatch)?;
                    out.push(steps.iter().map(|s| path_step(name, s)).collect::<Result<Vec<_>, _>>()?);
                }
                FieldValue::PathSet(out)
            }
            SerializedType::Vector256 => {
                let items = v.as_array().ok_or_else(mismatch)?;
                FieldValue::Vector256(
                    items
                        .iter()
                        .map(|item| fixed_hex(name, item))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
        };
        Ok(value)
    }
}

fn uint<T: TryFrom<u64>>(name: &str, v: &Value) -> Result<T, CodecError> {
    let n = v
        .as_u64()
        .ok_or_else(|| CodecError::invalid_value(name, format!("expected an unsigned integer, got {}", v)))?;
    T::try_from(n).map_err(|_| CodecError::invalid_value(name, format!("{} is out of range", n)))
}

fn fixed_hex<const N: usize>(name: &str, v: &Value) -> Result<[u8; N], CodecError> {
    let s = v
        .as_str()
        .ok_or_else(|| CodecError::invalid_value(name, "expected a hex string"))?;
    let bytes = hex::decode(s).map_err(|e| CodecError::invalid_value(name, e))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| CodecError::invalid_value(name, format!("expected {} bytes, got {}", N, b.len())))
}

fn account(name: &str, v: &Value) -> Result<AccountId, CodecError> {
    let s = v
        .as_str()
        .ok_or_else(|| CodecError::invalid_value(name, "expected an address string"))?;
    AccountId::from_address(s).map_err(|e| CodecError::invalid_value(name, e))
}

fn amount(name: &str, v: &Value) -> Result<Amount, CodecError> {
    match v {
        Value::String(drops) => {
            let drops: u64 = drops
                .parse()
                .map_err(|_| CodecError::invalid_value(name, format!("{:?} is not a drop count", drops)))?;
            Amount::native(drops).map_err(|e| CodecError::invalid_value(name, e))
        }
        Value::Object(map) => {
            let part = |key: &str| {
                map.get(key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| CodecError::invalid_value(name, format!("issued amount needs a string {:?}", key)))
            };
            let value = part("value")?
                .parse::<IouValue>()
                .map_err(|e| CodecError::invalid_value(name, e))?;
            let currency = Currency::from_code(part("currency")?).map_err(|e| CodecError::invalid_value(name, e))?;
            let issuer = AccountId::from_address(part("issuer")?).map_err(|e| CodecError::invalid_value(name, e))?;
            Ok(Amount::Issued(IssuedAmount {
                value,
                currency,
                issuer,
            }))
        }
        _ => Err(CodecError::TypeMismatch {
            field: name.to_string(),
            expected: SerializedType::Amount,
        }),
    }
}

fn path_step(name: &str, v: &Value) -> Result<PathStep, CodecError> {
    let map = v
        .as_object()
        .ok_or_else(|| CodecError::invalid_value(name, "path steps must be objects"))?;
    let mut step = PathStep::default();
    if let Some(a) = map.get("account") {
        step.account = Some(account(name, a)?);
    }
    if let Some(c) = map.get("currency") {
        let code = c
            .as_str()
            .ok_or_else(|| CodecError::invalid_value(name, "currency must be a string"))?;
        step.currency = Some(Currency::from_code_or_native(code).map_err(|e| CodecError::invalid_value(name, e))?);
    }
    if let Some(i) = map.get("issuer") {
        step.issuer = Some(account(name, i)?);
    }
    Ok(step)
}
