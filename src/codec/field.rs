//! Tagged encoding for a single localized text field.
//!
//! Wire shapes, by field state:
//!
//! * null            -> `0x02`
//! * empty string    -> `0x00 0x00`
//! * repeat string   -> `0x01` + u32 LE dictionary index
//! * first occurrence-> `0x01` + `0xFF 0xFF 0xFF 0xFF` + UTF-8 bytes + `0x00`
//!
//! The sentinel `0xFFFF_FFFF` after the presence tag tells the decoder the
//! string body follows inline instead of a dictionary reference; the decoder
//! is expected to intern inline bodies in arrival order, which is why the
//! encoder appends to its dictionary only after emitting the body.

use crate::codec::dictionary::StringDictionary;
use crate::codec::integer::encode_u32;
use crate::errors::{EncodeError, EncodeResult};

/// Tag for a present (non-null) string field.
pub const TAG_PRESENT: u8 = 0x01;
/// Tag for a null field.
pub const TAG_NULL: u8 = 0x02;
/// Tag for an empty (zero-length, non-null) string field.
pub const TAG_EMPTY: u8 = 0x00;
/// Terminator byte closing an inline string body.
pub const STRING_TERMINATOR: u8 = 0x00;
/// Reserved index marking an inline definition rather than a reference.
pub const INLINE_SENTINEL: u32 = 0xFFFF_FFFF;

/// A text field as read from the source, before encoding.
///
/// Null and empty are distinct states and stay distinct on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(text) => FieldValue::Text(text),
            None => FieldValue::Null,
        }
    }
}

/// Append the encoding of one field to `buf`.
///
/// Non-empty strings are checked for interior NUL bytes before anything is
/// written: an embedded terminator would truncate the value for every
/// decoder, so the field fails without touching `buf` or the dictionary.
pub fn encode_field(
    value: &FieldValue,
    dict: &mut StringDictionary,
    buf: &mut Vec<u8>,
) -> EncodeResult<()> {
    let text = match value {
        FieldValue::Null => {
            buf.push(TAG_NULL);
            return Ok(());
        }
        FieldValue::Text(text) => text,
    };

    if text.is_empty() {
        buf.push(TAG_EMPTY);
        buf.push(STRING_TERMINATOR);
        return Ok(());
    }

    if let Some(offset) = text.bytes().position(|b| b == STRING_TERMINATOR) {
        return Err(EncodeError::EmbeddedTerminator(offset));
    }

    buf.push(TAG_PRESENT);
    match dict.lookup(text) {
        Some(index) => {
            buf.extend_from_slice(&encode_u32(index));
        }
        None => {
            buf.extend_from_slice(&encode_u32(INLINE_SENTINEL));
            buf.extend_from_slice(text.as_bytes());
            buf.push(STRING_TERMINATOR);
            dict.insert(text)?;
        }
    }
    Ok(())
}
