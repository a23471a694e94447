//! The export pipeline: consume a row stream, encode, concatenate.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use log::{error, info};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::codec::RowEncoder;
use crate::errors::ExportResult;
use crate::export::repository::LocalizationRepository;
use crate::export::types::{ExportOutput, ExportRequest, ExportStats, ExportSummary};

#[async_trait]
pub trait ExportService: Send + Sync {
    /// Run one export: stream the source table, encode every row, return
    /// the concatenated blob with its summary.
    async fn export_blob(&self, request: &ExportRequest) -> ExportResult<ExportOutput>;
}

pub struct ExportServiceImpl {
    repo: Arc<dyn LocalizationRepository>,
}

impl ExportServiceImpl {
    pub fn new(repo: Arc<dyn LocalizationRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ExportService for ExportServiceImpl {
    async fn export_blob(&self, request: &ExportRequest) -> ExportResult<ExportOutput> {
        let id = Uuid::new_v4();
        let requested_at = Utc::now();
        let started = Instant::now();

        let expected = self.repo.count_rows(request).await?;
        info!(
            "Export {} started: ~{} rows from {}.{}",
            id, expected, request.table, request.locale_column
        );

        // One encoder, and thus one dictionary, per run. Rows are encoded
        // strictly in arrival order; their buffers are kept separate until
        // the stream is exhausted, so a failed run never leaves bytes
        // anywhere a caller could see them.
        let mut encoder = RowEncoder::new();
        let mut buffers: Vec<Vec<u8>> = Vec::new();
        let mut stream = self.repo.stream_rows(request);

        while let Some(item) = stream.next().await {
            let row = match item {
                Ok(row) => row,
                Err(e) => {
                    error!(
                        "Export {} aborted by source error after {} rows: {}",
                        id,
                        buffers.len(),
                        e
                    );
                    return Err(e);
                }
            };
            match encoder.encode_row(&row) {
                Ok(buf) => buffers.push(buf),
                Err(e) => {
                    error!(
                        "Export {} aborted by encode error at row {}: {}",
                        id,
                        buffers.len(),
                        e
                    );
                    return Err(e.into());
                }
            }
        }

        let blob = buffers.concat();
        let stats = ExportStats {
            rows_encoded: buffers.len(),
            bytes_written: blob.len(),
            dictionary_entries: encoder.dictionary_len(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        let checksum = hex::encode(Sha256::digest(&blob));

        info!(
            "Export {} completed: {} rows, {} bytes, {} dictionary entries in {} ms",
            id, stats.rows_encoded, stats.bytes_written, stats.dictionary_entries, stats.duration_ms
        );

        Ok(ExportOutput {
            blob,
            summary: ExportSummary {
                id,
                requested_at,
                table: request.table.clone(),
                locale_column: request.locale_column.clone(),
                stats,
                checksum,
            },
        })
    }
}
