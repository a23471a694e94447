//! Row-level encoding: one localization record to one byte buffer.

use crate::codec::dictionary::StringDictionary;
use crate::codec::field::{encode_field, FieldValue};
use crate::codec::integer::encode_u32;
use crate::errors::EncodeResult;

/// One record from a localization table, as handed to the encoder.
///
/// `index` is the record's ordinal within its table and column; the string
/// fields keep the source's null/empty distinction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedRow {
    pub table_name: FieldValue,
    pub column_name: FieldValue,
    pub index: u32,
    pub text: FieldValue,
}

/// Stateful encoder for a single export run.
///
/// Owns the run's [`StringDictionary`], so rows must be fed in their final
/// output order: the reference indices emitted for later rows depend on
/// every row encoded before them.
#[derive(Debug, Default)]
pub struct RowEncoder {
    dict: StringDictionary,
}

impl RowEncoder {
    pub fn new() -> Self {
        Self {
            dict: StringDictionary::new(),
        }
    }

    /// Encode one row into a fresh buffer.
    ///
    /// Fields are laid out back to back with no length prefix or padding:
    /// table name, column name, 4-byte LE index, localized text. On error
    /// the returned buffer is dropped here; dictionary entries interned by
    /// the row's earlier fields stay, which is harmless because the run
    /// never emits another byte after a failure.
    pub fn encode_row(&mut self, row: &LocalizedRow) -> EncodeResult<Vec<u8>> {
        let mut buf = Vec::new();
        encode_field(&row.table_name, &mut self.dict, &mut buf)?;
        encode_field(&row.column_name, &mut self.dict, &mut buf)?;
        buf.extend_from_slice(&encode_u32(row.index));
        encode_field(&row.text, &mut self.dict, &mut buf)?;
        Ok(buf)
    }

    /// Distinct strings interned so far.
    pub fn dictionary_len(&self) -> usize {
        self.dict.len()
    }
}
