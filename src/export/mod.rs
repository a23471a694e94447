//! Export pipeline and its row source.

pub mod repository;
pub mod service;
pub mod types;

pub use repository::{LocalizationRepository, SqliteLocalizationRepository};
pub use service::{ExportService, ExportServiceImpl};
pub use types::{ExportOutput, ExportRequest, ExportStats, ExportSummary, DEFAULT_BATCH_SIZE};
