mod error;

pub use error::{EncodeError, ExportError, SourceError};

/// Result type for wire-format encoding operations
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Result type for row source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for export runs
pub type ExportResult<T> = Result<T, ExportError>;
