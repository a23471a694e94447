use thiserror::Error;

/// Wire-format encoding errors
///
/// Every variant is fatal for the current export run: the output format has
/// no way to mark a bad row or a truncated stream, so the pipeline aborts
/// rather than emit a blob a decoder would misread.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Index value {0} outside the unsigned 32-bit range")]
    OutOfRangeInteger(i64),

    #[error("String dictionary full: next index would collide with the inline sentinel")]
    DictionaryOverflow,

    #[error("String value contains a NUL byte at offset {0}")]
    EmbeddedTerminator(usize),
}

/// Row source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Row decode error: {0}")]
    Row(String),
}

/// Export run errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}
