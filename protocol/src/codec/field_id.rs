//! Field headers.
//!
//! A field on the wire starts with its `(type_code, field_code)` pair packed
//! into one to three bytes:
//!
//! ```text
//! type < 16, field < 16     [type << 4 | field]
//! type < 16, field >= 16    [type << 4, field]
//! type >= 16, field < 16    [field, type]
//! type >= 16, field >= 16   [0, type, field]
//! ```

use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FieldIdError {
    #[error("field header truncated")]
    Truncated,

    #[error("field header uses a longer form than needed")]
    NonCanonical,
}

/// A field's `(type_code, field_code)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId {
    pub type_code: u8,
    pub field_code: u8,
}

impl FieldId {
    pub fn new(type_code: u8, field_code: u8) -> Self {
        Self { type_code, field_code }
    }

    /// Append the packed header to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        let (t, f) = (self.type_code, self.field_code);
        match (t < 16, f < 16) {
            (true, true) => out.push(t << 4 | f),
            (true, false) => out.extend_from_slice(&[t << 4, f]),
            (false, true) => out.extend_from_slice(&[f, t]),
            (false, false) => out.extend_from_slice(&[0, t, f]),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3);
        self.write(&mut out);
        out
    }

    /// Read a header from the front of `bytes`. Returns the id and the
    /// header length. Headers that could have used a shorter form are
    /// rejected, as are zero codes.
    pub fn read(bytes: &[u8]) -> Result<(Self, usize), FieldIdError> {
        let first = *bytes.first().ok_or(FieldIdError::Truncated)?;
        let high = first >> 4;
        let low = first & 0x0F;
        let byte_at = |i: usize| bytes.get(i).copied().ok_or(FieldIdError::Truncated);

        let (id, len) = match (high, low) {
            (0, 0) => {
                let (t, f) = (byte_at(1)?, byte_at(2)?);
                if t < 16 || f < 16 {
                    return Err(FieldIdError::NonCanonical);
                }
                (Self::new(t, f), 3)
            }
            (0, f) => {
                let t = byte_at(1)?;
                if t < 16 {
                    return Err(FieldIdError::NonCanonical);
                }
                (Self::new(t, f), 2)
            }
            (t, 0) => {
                let f = byte_at(1)?;
                if f < 16 {
                    return Err(FieldIdError::NonCanonical);
                }
                (Self::new(t, f), 2)
            }
            (t, f) => (Self::new(t, f), 1),
        };
        Ok((id, len))
    }
}
