//! Attachment repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::{Pool, Postgres};
use tracing::debug;

use billtext_core::{
    AttachmentRepository, DocumentType, Error, ExtractedText, PendingAttachment, Result,
    SelectionMode,
};

use crate::identifier::TableName;

/// SQL text for one table, rendered once at construction.
#[derive(Debug, Clone)]
struct AttachmentQueries {
    watermark: String,
    select_recent: String,
    select_since: String,
    select_all: String,
    update_text: String,
}

impl AttachmentQueries {
    fn for_table(table: &TableName) -> Self {
        let t = table.quoted();
        // id is cast so SERIAL and BIGSERIAL keys decode the same way.
        let select = format!(
            "SELECT id::bigint AS id, url FROM {t} \
             WHERE document_type = $1 AND full_text IS NULL"
        );
        Self {
            watermark: format!(
                "SELECT MAX(updated_at)::timestamptz FROM {t} WHERE full_text IS NOT NULL"
            ),
            select_recent: format!("{select} ORDER BY updated_at DESC LIMIT $2"),
            select_since: format!("{select} AND updated_at >= $2 ORDER BY updated_at DESC"),
            select_all: format!("{select} ORDER BY updated_at DESC"),
            update_text: format!(
                "UPDATE {t} AS docs SET full_text = batch.plain_text \
                 FROM UNNEST($1::bigint[], $2::text[]) AS batch(id, plain_text) \
                 WHERE docs.id = batch.id"
            ),
        }
    }
}

/// PostgreSQL implementation of AttachmentRepository.
pub struct PgAttachmentRepository {
    pool: Pool<Postgres>,
    table: TableName,
    queries: AttachmentQueries,
}

impl PgAttachmentRepository {
    /// Create a repository over `table` using the given connection pool.
    pub fn new(pool: Pool<Postgres>, table: TableName) -> Self {
        let queries = AttachmentQueries::for_table(&table);
        Self {
            pool,
            table,
            queries,
        }
    }

    /// The table this repository reads and updates.
    pub fn table(&self) -> &TableName {
        &self.table
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    async fn text_watermark(&self) -> Result<Option<DateTime<Utc>>> {
        let watermark: Option<DateTime<Utc>> = sqlx::query_scalar(&self.queries.watermark)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Selection)?;

        debug!(
            subsystem = "db",
            component = "attachments",
            op = "watermark",
            db_table = %self.table,
            watermark = ?watermark,
            "Read text watermark"
        );
        Ok(watermark)
    }

    fn select_pending(&self, mode: SelectionMode) -> BoxStream<'_, Result<PendingAttachment>> {
        let attachment = DocumentType::Attachment.code();
        let query = match mode {
            SelectionMode::Recent { limit } => {
                sqlx::query_as::<_, PendingAttachment>(&self.queries.select_recent)
                    .bind(attachment)
                    .bind(limit)
            }
            SelectionMode::Since { watermark } => {
                sqlx::query_as::<_, PendingAttachment>(&self.queries.select_since)
                    .bind(attachment)
                    .bind(watermark)
            }
            SelectionMode::All => {
                sqlx::query_as::<_, PendingAttachment>(&self.queries.select_all).bind(attachment)
            }
        };

        debug!(
            subsystem = "db",
            component = "attachments",
            op = "select_pending",
            db_table = %self.table,
            mode = %mode,
            "Streaming pending attachments"
        );

        query.fetch(&self.pool).map_err(Error::Selection).boxed()
    }

    async fn write_batch(&self, batch: &[ExtractedText]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i64> = batch.iter().map(|item| item.id).collect();
        let texts: Vec<&str> = batch.iter().map(|item| item.plain_text.as_str()).collect();

        // Dropping an uncommitted transaction rolls it back.
        let mut tx = self.pool.begin().await.map_err(Error::Write)?;
        let result = sqlx::query(&self.queries.update_text)
            .bind(&ids)
            .bind(&texts)
            .execute(&mut *tx)
            .await
            .map_err(Error::Write)?;
        tx.commit().await.map_err(Error::Write)?;

        debug!(
            subsystem = "db",
            component = "attachments",
            op = "write_batch",
            db_table = %self.table,
            batch_size = batch.len(),
            rows_affected = result.rows_affected(),
            "Committed text batch"
        );
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queries() -> AttachmentQueries {
        AttachmentQueries::for_table(&TableName::parse("councilmatic_core_billdocument").unwrap())
    }

    #[test]
    fn test_recent_query_is_limited_and_ordered() {
        let sql = queries().select_recent;
        assert!(sql.contains("FROM \"councilmatic_core_billdocument\""));
        assert!(sql.contains("document_type = $1"));
        assert!(sql.contains("full_text IS NULL"));
        assert!(sql.ends_with("ORDER BY updated_at DESC LIMIT $2"));
    }

    #[test]
    fn test_since_query_is_unbounded_and_inclusive() {
        let sql = queries().select_since;
        assert!(sql.contains("updated_at >= $2"));
        assert!(sql.contains("full_text IS NULL"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_all_query_filters_attachments_without_text() {
        let sql = queries().select_all;
        assert!(sql.contains("document_type = $1"));
        assert!(sql.contains("full_text IS NULL"));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("$2"));
    }

    #[test]
    fn test_watermark_query_reads_rows_with_text() {
        let sql = queries().watermark;
        assert!(sql.contains("MAX(updated_at)"));
        assert!(sql.contains("full_text IS NOT NULL"));
    }

    #[test]
    fn test_update_query_is_single_statement() {
        let sql = queries().update_text;
        assert!(sql.starts_with("UPDATE \"councilmatic_core_billdocument\""));
        assert!(sql.contains("UNNEST($1::bigint[], $2::text[])"));
        assert!(!sql.contains(';'));
    }

    #[test]
    fn test_queries_use_schema_qualified_table() {
        let table = TableName::in_schema("test_abc", "billdocument").unwrap();
        let q = AttachmentQueries::for_table(&table);
        assert!(q.select_all.contains("\"test_abc\".\"billdocument\""));
        assert!(q.update_text.contains("\"test_abc\".\"billdocument\""));
    }
}
