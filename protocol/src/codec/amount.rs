//! Amounts: native drops and issued (IOU) values.
//!
//! Both kinds start with a 64-bit word whose top bit tells them apart:
//!
//! ```text
//! native:  0 | 1 (positive) | 62-bit drops
//! issued:  1 | sign (1 = positive) | 8-bit exponent+97 | 54-bit mantissa
//!          followed by 20-byte currency and 20-byte issuer
//! ```
//!
//! Issued values are decimal floating point. The mantissa is normalized into
//! `[10^15, 10^16 - 1]` so every value has exactly one encoding. Zero is the
//! special word `0x8000000000000000`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::address::AccountId;
use crate::config::{
    MAX_IOU_EXPONENT, MAX_IOU_MANTISSA, MAX_IOU_PRECISION, MAX_NATIVE_DROPS, MIN_IOU_EXPONENT,
    MIN_IOU_MANTISSA,
};

const ISSUED_BIT: u64 = 1 << 63;
const POSITIVE_BIT: u64 = 1 << 62;
const MANTISSA_MASK: u64 = (1 << 54) - 1;
const EXPONENT_BIAS: i64 = 97;

const NATIVE_LEN: usize = 8;
const ISSUED_LEN: usize = 48;

/// Characters allowed in a 3-character currency code besides ASCII
/// alphanumerics.
const CURRENCY_SYMBOLS: &str = "?!@#$%^&*<>(){}[]|";

/// Errors constructing or decoding an amount.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("native amount {drops} exceeds the {max} drop supply", max = MAX_NATIVE_DROPS)]
    NativeOutOfRange { drops: u64 },

    #[error("native amounts cannot be negative")]
    NegativeNative,

    #[error("not a decimal number: {0:?}")]
    InvalidValue(String),

    #[error("{value} has more than {max} significant digits", max = MAX_IOU_PRECISION)]
    Precision { value: String },

    #[error("exponent {exponent} outside {min}..={max}", min = MIN_IOU_EXPONENT, max = MAX_IOU_EXPONENT)]
    ExponentOutOfRange { exponent: i64 },

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("non-canonical amount: {0}")]
    NonCanonical(&'static str),

    #[error("amount needs {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
}

// ---------------------------------------------------------------------------
// IouValue
// ---------------------------------------------------------------------------

/// A normalized issued-currency value.
///
/// Either zero, or `±mantissa × 10^exponent` with the mantissa in
/// `[10^15, 10^16 - 1]` and the exponent in `-96..=80`. Because the form is
/// unique, derived equality is value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IouValue {
    mantissa: u64,
    exponent: i32,
    negative: bool,
}

impl IouValue {
    pub const ZERO: IouValue = IouValue {
        mantissa: 0,
        exponent: 0,
        negative: false,
    };

    /// Build and normalize `±mantissa × 10^exponent`.
    ///
    /// Fails if the value needs more than 16 significant digits or its
    /// normalized exponent falls outside the representable range. Nothing is
    /// rounded or flushed to zero.
    pub fn new(mantissa: u64, exponent: i32, negative: bool) -> Result<Self, AmountError> {
        Self::normalize(mantissa, i64::from(exponent), negative)
    }

    fn normalize(mantissa: u64, exponent: i64, negative: bool) -> Result<Self, AmountError> {
        if mantissa == 0 {
            return Ok(Self::ZERO);
        }
        let out_of_range = || AmountError::ExponentOutOfRange { exponent };
        let mut m = mantissa;
        let mut e = exponent;
        while m < MIN_IOU_MANTISSA {
            m *= 10;
            e = e.checked_sub(1).ok_or_else(out_of_range)?;
        }
        while m > MAX_IOU_MANTISSA {
            if m % 10 != 0 {
                return Err(AmountError::Precision {
                    value: format!("{}e{}", mantissa, exponent),
                });
            }
            m /= 10;
            e = e.checked_add(1).ok_or_else(out_of_range)?;
        }
        if e < i64::from(MIN_IOU_EXPONENT) || e > i64::from(MAX_IOU_EXPONENT) {
            return Err(AmountError::ExponentOutOfRange { exponent: e });
        }
        Ok(Self {
            mantissa: m,
            exponent: e as i32,
            negative,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn mantissa(&self) -> u64 {
        self.mantissa
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// The 64-bit amount word.
    pub fn to_bits(&self) -> u64 {
        if self.is_zero() {
            return ISSUED_BIT;
        }
        let mut bits = ISSUED_BIT | self.mantissa;
        if !self.negative {
            bits |= POSITIVE_BIT;
        }
        bits | (((i64::from(self.exponent) + EXPONENT_BIAS) as u64) << 54)
    }

    /// Parse an issued amount word. Only canonical encodings are accepted.
    pub fn from_bits(bits: u64) -> Result<Self, AmountError> {
        if bits & ISSUED_BIT == 0 {
            return Err(AmountError::NonCanonical("issued amount without the issued bit"));
        }
        if bits == ISSUED_BIT {
            return Ok(Self::ZERO);
        }
        let mantissa = bits & MANTISSA_MASK;
        let exponent = ((bits >> 54) & 0xFF) as i64 - EXPONENT_BIAS;
        if !(MIN_IOU_MANTISSA..=MAX_IOU_MANTISSA).contains(&mantissa) {
            return Err(AmountError::NonCanonical("mantissa not normalized"));
        }
        if exponent < i64::from(MIN_IOU_EXPONENT) || exponent > i64::from(MAX_IOU_EXPONENT) {
            return Err(AmountError::NonCanonical("exponent out of range"));
        }
        Ok(Self {
            mantissa,
            exponent: exponent as i32,
            negative: bits & POSITIVE_BIT == 0,
        })
    }
}

impl FromStr for IouValue {
    type Err = AmountError;

    /// Accepts `123`, `-1.5`, `.25`, `1e-3`, `4.2E+7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AmountError::InvalidValue(s.to_string());

        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (number, exponent) = match rest.find(|c: char| c == 'e' || c == 'E') {
            Some(i) => {
                let exp: i64 = rest[i + 1..].parse().map_err(|_| invalid())?;
                (&rest[..i], exp)
            }
            None => (rest, 0),
        };
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = format!("{}{}", int_part, frac_part);
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            return Ok(Self::ZERO);
        }
        let significant = trimmed.trim_end_matches('0');
        if significant.len() > MAX_IOU_PRECISION {
            return Err(AmountError::Precision { value: s.to_string() });
        }
        let exponent = exponent
            .checked_sub(frac_part.len() as i64)
            .and_then(|e| e.checked_add((trimmed.len() - significant.len()) as i64))
            .ok_or_else(invalid)?;
        let mantissa: u64 = significant.parse().map_err(|_| invalid())?;
        Self::normalize(mantissa, exponent, negative)
    }
}

impl fmt::Display for IouValue {
    /// Plain decimal for exponents in `-25..=-5`, `<mantissa>e<exponent>`
    /// otherwise, matching the ledger's own text form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let sign = if self.negative { "-" } else { "" };
        if self.exponent != 0 && !(-25..=-5).contains(&self.exponent) {
            return write!(f, "{}{}e{}", sign, self.mantissa, self.exponent);
        }

        let mut digits = self.mantissa.to_string();
        let frac_len = (-self.exponent) as usize;
        if digits.len() <= frac_len {
            let pad = frac_len + 1 - digits.len();
            digits.insert_str(0, &"0".repeat(pad));
        }
        let (int_part, frac_part) = digits.split_at(digits.len() - frac_len);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            write!(f, "{}{}", sign, int_part)
        } else {
            write!(f, "{}{}.{}", sign, int_part, frac_part)
        }
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

const NATIVE_CODE_HEX: &str = "0000000000000000000000000000000000000000";

/// A 20-byte currency code.
///
/// Standard codes are three ASCII characters at bytes 12..15 of an
/// otherwise zero field. Anything else is carried as 40 hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency([u8; 20]);

impl Currency {
    /// The native currency, all zero bytes.
    pub const NATIVE: Currency = Currency([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a 3-character code or 40 hex digits. `"XRP"` and the all-zero
    /// code are the native currency and cannot be issued.
    pub fn from_code(code: &str) -> Result<Self, AmountError> {
        let invalid = || AmountError::InvalidCurrency(code.to_string());
        if code.len() == 3 {
            if code == "XRP" {
                return Err(invalid());
            }
            let valid = code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || CURRENCY_SYMBOLS.contains(c));
            if !valid {
                return Err(invalid());
            }
            let mut bytes = [0u8; 20];
            bytes[12..15].copy_from_slice(code.as_bytes());
            return Ok(Self(bytes));
        }
        if code.len() == 40 {
            let raw = hex::decode(code).map_err(|_| invalid())?;
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&raw);
            let currency = Self(bytes);
            if currency.is_native() || currency.standard_code() == Some("XRP") {
                return Err(invalid());
            }
            return Ok(currency);
        }
        Err(invalid())
    }

    /// Like [`Currency::from_code`], but also accepts the native currency
    /// as `"XRP"` or the all-zero code. Path steps may name it.
    pub fn from_code_or_native(code: &str) -> Result<Self, AmountError> {
        if code == "XRP" || code == NATIVE_CODE_HEX {
            return Ok(Self::NATIVE);
        }
        Self::from_code(code)
    }

    /// All-zero: the native currency's code in `Hash160` fields.
    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The 3-character code, if this currency uses the standard layout.
    pub fn standard_code(&self) -> Option<&str> {
        let zero_elsewhere = self.0[..12].iter().chain(&self.0[15..]).all(|&b| b == 0);
        if !zero_elsewhere || self.is_native() {
            return None;
        }
        std::str::from_utf8(&self.0[12..15])
            .ok()
            .filter(|s| s.chars().all(|c| c.is_ascii_graphic()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            return f.write_str("XRP");
        }
        match self.standard_code() {
            Some(code) => f.write_str(code),
            None => f.write_str(&hex::encode_upper(self.0)),
        }
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self)
    }
}

impl FromStr for Currency {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// An issued-currency amount: value, currency, issuing account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssuedAmount {
    pub value: IouValue,
    pub currency: Currency,
    pub issuer: AccountId,
}

/// A value in an `Amount` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Amount {
    /// Drops of the native asset. One XRP is 1,000,000 drops.
    Native(u64),
    Issued(IssuedAmount),
}

impl Amount {
    /// Checked native amount.
    pub fn native(drops: u64) -> Result<Self, AmountError> {
        if drops > MAX_NATIVE_DROPS {
            return Err(AmountError::NativeOutOfRange { drops });
        }
        Ok(Self::Native(drops))
    }

    /// Issued amount from its text parts.
    pub fn issued(value: &str, currency: &str, issuer: AccountId) -> Result<Self, AmountError> {
        Ok(Self::Issued(IssuedAmount {
            value: value.parse()?,
            currency: Currency::from_code(currency)?,
            issuer,
        }))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    /// Wire bytes: 8 for native, 48 for issued.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AmountError> {
        match self {
            Self::Native(drops) => {
                if *drops > MAX_NATIVE_DROPS {
                    return Err(AmountError::NativeOutOfRange { drops: *drops });
                }
                Ok((POSITIVE_BIT | drops).to_be_bytes().to_vec())
            }
            Self::Issued(issued) => {
                if issued.currency.is_native() {
                    return Err(AmountError::InvalidCurrency(issued.currency.to_string()));
                }
                let mut out = Vec::with_capacity(ISSUED_LEN);
                out.extend_from_slice(&issued.value.to_bits().to_be_bytes());
                out.extend_from_slice(issued.currency.as_bytes());
                out.extend_from_slice(issued.issuer.as_bytes());
                Ok(out)
            }
        }
    }

    /// Parse an amount from the front of `bytes`. Returns the amount and
    /// the number of bytes consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), AmountError> {
        let word = read_word(bytes)?;
        if word & ISSUED_BIT == 0 {
            if word & POSITIVE_BIT == 0 {
                return Err(AmountError::NegativeNative);
            }
            let drops = word & !POSITIVE_BIT;
            return Ok((Self::native(drops)?, NATIVE_LEN));
        }

        if bytes.len() < ISSUED_LEN {
            return Err(AmountError::Truncated {
                needed: ISSUED_LEN,
                got: bytes.len(),
            });
        }
        let value = IouValue::from_bits(word)?;
        let mut currency = [0u8; 20];
        currency.copy_from_slice(&bytes[8..28]);
        let currency = Currency::from_bytes(currency);
        if currency.is_native() {
            return Err(AmountError::NonCanonical("issued amount in the native currency"));
        }
        let mut issuer = [0u8; 20];
        issuer.copy_from_slice(&bytes[28..48]);
        Ok((
            Self::Issued(IssuedAmount {
                value,
                currency,
                issuer: AccountId::from_bytes(issuer),
            }),
            ISSUED_LEN,
        ))
    }
}

fn read_word(bytes: &[u8]) -> Result<u64, AmountError> {
    let word: [u8; 8] = bytes
        .get(..NATIVE_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or(AmountError::Truncated {
            needed: NATIVE_LEN,
            got: bytes.len(),
        })?;
    Ok(u64::from_be_bytes(word))
}
