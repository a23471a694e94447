//! Wire-format encoding primitives.

pub mod dictionary;
pub mod field;
pub mod integer;
pub mod row;

pub use dictionary::StringDictionary;
pub use field::{
    encode_field, FieldValue, INLINE_SENTINEL, STRING_TERMINATOR, TAG_EMPTY, TAG_NULL, TAG_PRESENT,
};
pub use integer::{encode_u32, index_from_i64};
pub use row::{LocalizedRow, RowEncoder};
