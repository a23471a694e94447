use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rows fetched per batch while streaming the source table.
pub const DEFAULT_BATCH_SIZE: u32 = 500;

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

/// High-level request describing one export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Source table holding the localization rows.
    pub table: String,
    /// Locale column to export, e.g. `en_us`.
    pub locale_column: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl ExportRequest {
    pub fn new(table: impl Into<String>, locale_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            locale_column: locale_column.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counters filled in while a run executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub rows_encoded: usize,
    pub bytes_written: usize,
    pub dictionary_entries: usize,
    pub duration_ms: u64,
}

/// Summary returned to the caller after a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub table: String,
    pub locale_column: String,
    pub stats: ExportStats,
    /// Hex SHA-256 of the blob.
    pub checksum: String,
}

/// A finished run: the encoded blob plus its summary.
///
/// The blob is handed back whole; writing it somewhere is the caller's job.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub blob: Vec<u8>,
    pub summary: ExportSummary,
}
