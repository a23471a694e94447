use crate::errors::{EncodeError, EncodeResult};

/// Encode an unsigned 32-bit value as exactly 4 little-endian bytes.
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Convert a raw SQLite `INTEGER` into a row index.
///
/// The wire format carries indices as unsigned 32-bit values; anything the
/// source hands over outside `0..=u32::MAX` is rejected rather than wrapped
/// or truncated.
pub fn index_from_i64(raw: i64) -> EncodeResult<u32> {
    u32::try_from(raw).map_err(|_| EncodeError::OutOfRangeInteger(raw))
}
