use std::sync::Arc;

// Public modules
pub mod codec;
pub mod errors;
pub mod export;

use errors::ExportResult;
use export::{ExportOutput, ExportRequest, ExportService, ExportServiceImpl, SqliteLocalizationRepository};

/// Run one export against the given pool and hand back the encoded blob
/// with its summary. Convenience wiring for callers that don't need to
/// hold the repository or service themselves.
pub async fn export_blob(
    pool: sqlx::SqlitePool,
    request: &ExportRequest,
) -> ExportResult<ExportOutput> {
    let repo = Arc::new(SqliteLocalizationRepository::new(pool));
    let service = ExportServiceImpl::new(repo);
    service.export_blob(request).await
}
