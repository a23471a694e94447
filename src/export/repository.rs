//! Row source for export runs.
//!
//! The SQLite implementation pages the source table in rowid order from a
//! spawned producer task and hands rows to the consumer over a bounded
//! channel, so the table never has to fit in memory on the read side.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;
use log::{debug, error};
use sqlx::{Row, SqlitePool};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::codec::index_from_i64;
use crate::codec::LocalizedRow;
use crate::errors::{ExportError, ExportResult, SourceError, SourceResult};
use crate::export::types::ExportRequest;

/// Rows buffered between the producer task and the consuming pipeline.
const CHANNEL_CAPACITY: usize = 32;

/// Source of localization rows for one export run.
#[async_trait]
pub trait LocalizationRepository: Send + Sync {
    /// Stream rows in stable rowid order. Errors arrive in-band as stream
    /// items; the stream ends after the first one.
    fn stream_rows(
        &self,
        request: &ExportRequest,
    ) -> Pin<Box<dyn Stream<Item = ExportResult<LocalizedRow>> + Send>>;

    /// Row count for progress estimation.
    async fn count_rows(&self, request: &ExportRequest) -> SourceResult<u64>;
}

/// SQLite implementation scanning one localization table.
pub struct SqliteLocalizationRepository {
    pool: SqlitePool,
}

impl SqliteLocalizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Accept only plain SQL identifiers: ASCII letters, digits and `_`, not
/// starting with a digit. Anything else is rejected, never quoted or
/// rewritten, since these names are substituted into the scan statement.
fn validate_identifier(name: &str) -> SourceResult<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(SourceError::InvalidIdentifier(name.to_string()))
    }
}

/// Build the batch scan statement from validated identifiers. The cursor
/// and limit stay bind parameters. A NULL cursor marks the first batch,
/// which has no lower bound: SQLite accepts explicit rowids anywhere in the
/// i64 range, so no starting value below every row exists.
fn scan_statement(request: &ExportRequest) -> SourceResult<String> {
    let table = validate_identifier(&request.table)?;
    let locale = validate_identifier(&request.locale_column)?;
    Ok(format!(
        "SELECT rowid, tbl_name, tbl_col_name, idx, {locale} \
         FROM {table} WHERE (?1 IS NULL OR rowid > ?1) ORDER BY rowid ASC LIMIT ?2"
    ))
}

fn materialize_row(
    row: &sqlx::sqlite::SqliteRow,
    locale_column: &str,
) -> ExportResult<LocalizedRow> {
    let table_name: Option<String> = row
        .try_get("tbl_name")
        .map_err(|e| SourceError::Row(e.to_string()))?;
    let column_name: Option<String> = row
        .try_get("tbl_col_name")
        .map_err(|e| SourceError::Row(e.to_string()))?;
    let raw_index: i64 = row
        .try_get("idx")
        .map_err(|e| SourceError::Row(e.to_string()))?;
    let text: Option<String> = row
        .try_get(locale_column)
        .map_err(|e| SourceError::Row(e.to_string()))?;

    Ok(LocalizedRow {
        table_name: table_name.into(),
        column_name: column_name.into(),
        index: index_from_i64(raw_index)?,
        text: text.into(),
    })
}

#[async_trait]
impl LocalizationRepository for SqliteLocalizationRepository {
    fn stream_rows(
        &self,
        request: &ExportRequest,
    ) -> Pin<Box<dyn Stream<Item = ExportResult<LocalizedRow>> + Send>> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let scan_sql = match scan_statement(request) {
            Ok(sql) => sql,
            Err(e) => {
                // Fresh channel, capacity > 0: the send cannot fail.
                let _ = tx.try_send(Err(ExportError::Source(e)));
                return Box::pin(ReceiverStream::new(rx));
            }
        };

        let pool = self.pool.clone();
        let table = request.table.clone();
        let locale_column = request.locale_column.clone();
        // LIMIT 0 would end the scan before it starts.
        let limit = i64::from(request.batch_size.max(1));

        tokio::spawn(async move {
            let mut cursor: Option<i64> = None;

            loop {
                let batch = sqlx::query(&scan_sql)
                    .bind(cursor)
                    .bind(limit)
                    .fetch_all(&pool)
                    .await;

                match batch {
                    Ok(rows) => {
                        if rows.is_empty() {
                            break;
                        }
                        debug!("Fetched batch of {} rows from {}", rows.len(), table);

                        for row in rows {
                            match row.try_get::<i64, _>("rowid") {
                                Ok(rowid) => cursor = Some(rowid),
                                Err(e) => {
                                    let _ = tx
                                        .send(Err(SourceError::Row(e.to_string()).into()))
                                        .await;
                                    return;
                                }
                            }

                            match materialize_row(&row, &locale_column) {
                                Ok(localized) => {
                                    if tx.send(Ok(localized)).await.is_err() {
                                        return; // Receiver dropped
                                    }
                                }
                                Err(e) => {
                                    let _ = tx.send(Err(e)).await;
                                    return;
                                }
                            }
                        }

                        // Yield to prevent blocking
                        tokio::task::yield_now().await;
                    }
                    Err(e) => {
                        error!("Batch fetch from {} failed: {}", table, e);
                        let _ = tx.send(Err(SourceError::Sqlx(e).into())).await;
                        return;
                    }
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }

    async fn count_rows(&self, request: &ExportRequest) -> SourceResult<u64> {
        let table = validate_identifier(&request.table)?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldValue;
    use crate::errors::EncodeError;
    use futures::StreamExt;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn seed(pool: &SqlitePool, rows: &[(&str, &str, i64, Option<&str>)]) {
        sqlx::query(
            "CREATE TABLE localizable (tbl_name TEXT, tbl_col_name TEXT, idx INTEGER, en_us TEXT)",
        )
        .execute(pool)
        .await
        .unwrap();
        for (table, column, index, text) in rows {
            sqlx::query(
                "INSERT INTO localizable (tbl_name, tbl_col_name, idx, en_us) VALUES (?, ?, ?, ?)",
            )
            .bind(table)
            .bind(column)
            .bind(index)
            .bind(text)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    async fn insert_at_rowid(pool: &SqlitePool, rowid: i64, index: i64, text: &str) {
        sqlx::query(
            "INSERT INTO localizable (rowid, tbl_name, tbl_col_name, idx, en_us) \
             VALUES (?, 'menu', 'title', ?, ?)",
        )
        .bind(rowid)
        .bind(index)
        .bind(text)
        .execute(pool)
        .await
        .unwrap();
    }

    fn request() -> ExportRequest {
        ExportRequest::new("localizable", "en_us")
    }

    async fn collect(
        repo: &SqliteLocalizationRepository,
        request: &ExportRequest,
    ) -> Vec<ExportResult<LocalizedRow>> {
        let mut stream = repo.stream_rows(request);
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_streams_rows_in_rowid_order() {
        let pool = memory_pool().await;
        seed(
            &pool,
            &[
                ("menu", "title", 0, Some("Play")),
                ("menu", "title", 1, None),
                ("menu", "subtitle", 2, Some("")),
            ],
        )
        .await;
        let repo = SqliteLocalizationRepository::new(pool);

        let items = collect(&repo, &request()).await;
        let rows: Vec<LocalizedRow> = items.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].text, FieldValue::Text("Play".into()));
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[1].text, FieldValue::Null);
        assert_eq!(rows[2].index, 2);
        assert_eq!(rows[2].text, FieldValue::Text(String::new()));
        assert_eq!(rows[2].column_name, FieldValue::Text("subtitle".into()));
    }

    #[tokio::test]
    async fn test_cursor_pagination_covers_full_table() {
        let pool = memory_pool().await;
        let seeded: Vec<(String, String, i64, Option<String>)> = (0..25)
            .map(|i| ("menu".to_string(), "title".to_string(), i, Some(format!("s{i}"))))
            .collect();
        let borrowed: Vec<(&str, &str, i64, Option<&str>)> = seeded
            .iter()
            .map(|(t, c, i, v)| (t.as_str(), c.as_str(), *i, v.as_deref()))
            .collect();
        seed(&pool, &borrowed).await;
        let repo = SqliteLocalizationRepository::new(pool);

        let mut req = request();
        req.batch_size = 4;
        let items = collect(&repo, &req).await;

        let indices: Vec<u32> = items.into_iter().map(|r| r.unwrap().index).collect();
        assert_eq!(indices, (0..25).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_includes_row_at_minimum_rowid() {
        let pool = memory_pool().await;
        seed(&pool, &[]).await;
        insert_at_rowid(&pool, i64::MIN, 0, "Play").await;
        insert_at_rowid(&pool, 1, 1, "Stop").await;
        let repo = SqliteLocalizationRepository::new(pool);

        // batch_size 1 forces a second batch whose cursor sits at i64::MIN.
        let mut req = request();
        req.batch_size = 1;
        let items = collect(&repo, &req).await;
        let rows: Vec<LocalizedRow> = items.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].text, FieldValue::Text("Play".into()));
        assert_eq!(rows[1].index, 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_table_identifier() {
        let pool = memory_pool().await;
        let repo = SqliteLocalizationRepository::new(pool);

        let mut req = request();
        req.table = "localizable; DROP TABLE localizable".to_string();
        let items = collect(&repo, &req).await;

        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(ExportError::Source(SourceError::InvalidIdentifier(name))) => {
                assert!(name.starts_with("localizable;"));
            }
            other => panic!("expected identifier rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_invalid_locale_column() {
        let pool = memory_pool().await;
        let repo = SqliteLocalizationRepository::new(pool);

        let mut req = request();
        req.locale_column = "1st_locale".to_string();
        let items = collect(&repo, &req).await;

        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(ExportError::Source(SourceError::InvalidIdentifier(_)))
        ));
    }

    #[tokio::test]
    async fn test_negative_index_ends_stream_with_error() {
        let pool = memory_pool().await;
        seed(
            &pool,
            &[
                ("menu", "title", 0, Some("Play")),
                ("menu", "title", -5, Some("Stop")),
                ("menu", "title", 2, Some("Pause")),
            ],
        )
        .await;
        let repo = SqliteLocalizationRepository::new(pool);

        let items = collect(&repo, &request()).await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(
            items[1],
            Err(ExportError::Encode(EncodeError::OutOfRangeInteger(-5)))
        ));
    }

    #[tokio::test]
    async fn test_count_rows() {
        let pool = memory_pool().await;
        seed(
            &pool,
            &[("menu", "title", 0, Some("a")), ("menu", "title", 1, Some("b"))],
        )
        .await;
        let repo = SqliteLocalizationRepository::new(pool);

        assert_eq!(repo.count_rows(&request()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_file_backed_database() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let url = format!("sqlite://{}", file.path().display());
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        seed(&pool, &[("menu", "title", 7, Some("Play"))]).await;
        let repo = SqliteLocalizationRepository::new(pool);

        let items = collect(&repo, &request()).await;
        assert_eq!(items.len(), 1);
        let row = items.into_iter().next().unwrap().unwrap();
        assert_eq!(row.index, 7);
        assert_eq!(row.table_name, FieldValue::Text("menu".into()));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("localizable").is_ok());
        assert!(validate_identifier("en_us").is_ok());
        assert!(validate_identifier("_hidden2").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("name with spaces").is_err());
        assert!(validate_identifier("name;--").is_err());
        assert!(validate_identifier("naïve").is_err());
    }
}
