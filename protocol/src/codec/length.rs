//! Variable-length (VL) prefixes for blobs, account ids and hash vectors.
//!
//! | length          | prefix bytes                                          |
//! |-----------------|-------------------------------------------------------|
//! | 0..=192         | `[len]`                                               |
//! | 193..=12480     | `[193 + (l >> 8), l & 0xFF]`, `l = len - 193`          |
//! | 12481..=918744  | `[241 + (l >> 16), (l >> 8) & 0xFF, l & 0xFF]`, `l = len - 12481` |

use thiserror::Error;

use crate::config::{VL_ONE_BYTE_MAX, VL_THREE_BYTE_MAX, VL_TWO_BYTE_MAX};

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LengthError {
    #[error("length {0} cannot be VL-encoded")]
    TooLong(usize),

    #[error("length prefix truncated")]
    Truncated,

    #[error("invalid length prefix byte {0:#04x}")]
    InvalidPrefix(u8),
}

/// Append the VL prefix for `length` to `out`.
pub fn write_length(out: &mut Vec<u8>, length: usize) -> Result<(), LengthError> {
    if length <= VL_ONE_BYTE_MAX {
        out.push(length as u8);
    } else if length <= VL_TWO_BYTE_MAX {
        let l = length - (VL_ONE_BYTE_MAX + 1);
        out.push(193 + (l >> 8) as u8);
        out.push((l & 0xFF) as u8);
    } else if length <= VL_THREE_BYTE_MAX {
        let l = length - (VL_TWO_BYTE_MAX + 1);
        out.push(241 + (l >> 16) as u8);
        out.push(((l >> 8) & 0xFF) as u8);
        out.push((l & 0xFF) as u8);
    } else {
        return Err(LengthError::TooLong(length));
    }
    Ok(())
}

/// Read a VL prefix from the front of `bytes`. Returns the decoded length
/// and the prefix size.
pub fn read_length(bytes: &[u8]) -> Result<(usize, usize), LengthError> {
    let byte_at = |i: usize| bytes.get(i).map(|&b| b as usize).ok_or(LengthError::Truncated);
    let b0 = byte_at(0)?;
    match b0 {
        0..=192 => Ok((b0, 1)),
        193..=240 => {
            let b1 = byte_at(1)?;
            Ok((VL_ONE_BYTE_MAX + 1 + ((b0 - 193) << 8) + b1, 2))
        }
        241..=254 => {
            let (b1, b2) = (byte_at(1)?, byte_at(2)?);
            let length = VL_TWO_BYTE_MAX + 1 + ((b0 - 241) << 16) + (b1 << 8) + b2;
            if length > VL_THREE_BYTE_MAX {
                return Err(LengthError::InvalidPrefix(b0 as u8));
            }
            Ok((length, 3))
        }
        _ => Err(LengthError::InvalidPrefix(b0 as u8)),
    }
}
