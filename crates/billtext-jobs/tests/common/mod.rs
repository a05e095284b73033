//! Shared fixtures for the pipeline integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::stream::{self, BoxStream, StreamExt};

use billtext_jobs::{
    AttachmentExtractor, AttachmentRecord, AttachmentRepository, ConversionJob, DocumentType,
    Error, ExtractedText, ExtractionRegistry, HttpFetcher, JobOptions, PendingAttachment, Result,
    ScratchDir, SelectionMode,
};

/// In-memory stand-in for the bill document table.
///
/// Selection snapshots the table when called, matching a database cursor
/// that does not see rows written later in the same run.
#[derive(Default)]
pub struct MemoryAttachmentRepository {
    records: Mutex<Vec<AttachmentRecord>>,
    batches: Mutex<Vec<Vec<ExtractedText>>>,
    fail_on_batch: Option<usize>,
}

impl MemoryAttachmentRepository {
    pub fn new(records: Vec<AttachmentRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Make the `n`th write (1-based) fail.
    pub fn failing_on_batch(mut self, n: usize) -> Self {
        self.fail_on_batch = Some(n);
        self
    }

    pub fn full_text(&self, id: i64) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.full_text.clone())
    }

    pub fn batches(&self) -> Vec<Vec<ExtractedText>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }

    pub fn written_ids(&self) -> Vec<i64> {
        self.batches()
            .iter()
            .flat_map(|b| b.iter().map(|t| t.id))
            .collect()
    }
}

#[async_trait]
impl AttachmentRepository for MemoryAttachmentRepository {
    async fn text_watermark(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.full_text.is_some())
            .map(|r| r.updated_at)
            .max())
    }

    fn select_pending(&self, mode: SelectionMode) -> BoxStream<'_, Result<PendingAttachment>> {
        let mut rows: Vec<AttachmentRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_eligible() && mode.admits(r.updated_at))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if let Some(limit) = mode.limit() {
            rows.truncate(limit as usize);
        }

        stream::iter(rows.into_iter().map(|r| {
            Ok(PendingAttachment {
                id: r.id,
                url: r.url,
            })
        }))
        .boxed()
    }

    async fn write_batch(&self, batch: &[ExtractedText]) -> Result<u64> {
        let attempt = self.batches.lock().unwrap().len() + 1;
        if self.fail_on_batch == Some(attempt) {
            return Err(Error::Write(sqlx::Error::PoolTimedOut));
        }

        let mut records = self.records.lock().unwrap();
        let mut updated = 0;
        for text in batch {
            if let Some(record) = records.iter_mut().find(|r| r.id == text.id) {
                record.full_text = Some(text.plain_text.clone());
                updated += 1;
            }
        }
        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(updated)
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// Attachment row `id` updated `id` minutes after the base time.
pub fn attachment(id: i64, url: String) -> AttachmentRecord {
    AttachmentRecord {
        id,
        url,
        document_type: DocumentType::Attachment,
        full_text: None,
        updated_at: base_time() + Duration::minutes(id),
    }
}

pub fn with_text(mut record: AttachmentRecord, text: &str) -> AttachmentRecord {
    record.full_text = Some(text.to_string());
    record
}

pub fn version(mut record: AttachmentRecord) -> AttachmentRecord {
    record.document_type = DocumentType::Version;
    record
}

/// Body served for attachment `id`.
pub fn body_for(id: i64) -> String {
    format!("Text of attachment {}", id)
}

pub fn job(repo: Arc<MemoryAttachmentRepository>, options: JobOptions) -> ConversionJob {
    let extractor = AttachmentExtractor::new(
        Arc::new(HttpFetcher::new(None).unwrap()),
        ExtractionRegistry::with_defaults(std::time::Duration::from_secs(10)),
        ScratchDir::temporary().unwrap(),
    );
    ConversionJob::new(repo, extractor, options)
}
