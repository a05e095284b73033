//! Batched persistence of extracted text.

use std::sync::Arc;

use tracing::info;

use billtext_core::{AttachmentRepository, ExtractedText, Result};

/// Totals reported by [`BatchWriter::finish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub batches: u64,
    pub rows_updated: u64,
}

/// Accumulates results and commits them `batch_size` at a time.
///
/// Each batch is one transaction. Batches commit in the order their rows
/// were pushed; a failed batch leaves earlier ones committed.
pub struct BatchWriter {
    repo: Arc<dyn AttachmentRepository>,
    batch_size: usize,
    pending: Vec<ExtractedText>,
    stats: WriteStats,
}

impl BatchWriter {
    pub fn new(repo: Arc<dyn AttachmentRepository>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            repo,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            stats: WriteStats::default(),
        }
    }

    /// Buffer a result, committing the batch once it is full.
    pub async fn push(&mut self, text: ExtractedText) -> Result<()> {
        self.pending.push(text);
        if self.pending.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Commit whatever is left and return the totals.
    pub async fn finish(mut self) -> Result<WriteStats> {
        self.flush().await?;
        Ok(self.stats)
    }

    async fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let updated = self.repo.write_batch(&self.pending).await?;
        self.stats.batches += 1;
        self.stats.rows_updated += updated;

        info!(
            subsystem = "jobs",
            component = "writer",
            op = "write_batch",
            batch = self.stats.batches,
            rows = self.pending.len(),
            updated,
            "Batch committed"
        );

        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use futures::stream::{self, BoxStream, StreamExt};

    use billtext_core::{PendingAttachment, SelectionMode};

    /// Records the size of every committed batch.
    #[derive(Default)]
    struct BatchLog {
        sizes: Mutex<Vec<usize>>,
    }

    impl BatchLog {
        fn sizes(&self) -> Vec<usize> {
            self.sizes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AttachmentRepository for BatchLog {
        async fn text_watermark(&self) -> Result<Option<DateTime<Utc>>> {
            Ok(None)
        }

        fn select_pending(&self, _mode: SelectionMode) -> BoxStream<'_, Result<PendingAttachment>> {
            stream::empty().boxed()
        }

        async fn write_batch(&self, batch: &[ExtractedText]) -> Result<u64> {
            self.sizes.lock().unwrap().push(batch.len());
            Ok(batch.len() as u64)
        }
    }

    fn text(id: i64) -> ExtractedText {
        ExtractedText {
            id,
            plain_text: format!("Attachment {}", id),
        }
    }

    async fn write_all(log: &Arc<BatchLog>, count: i64) -> WriteStats {
        let mut writer = BatchWriter::new(log.clone(), 20);
        for id in 1..=count {
            writer.push(text(id)).await.unwrap();
        }
        writer.finish().await.unwrap()
    }

    #[tokio::test]
    async fn test_exactly_full_batch_commits_once() {
        let log = Arc::new(BatchLog::default());
        let mut writer = BatchWriter::new(log.clone(), 20);
        for id in 1..=20 {
            writer.push(text(id)).await.unwrap();
        }
        // The 20th push commits; nothing is left for finish
        assert!(writer.pending.is_empty());
        assert_eq!(log.sizes(), vec![20]);

        let stats = writer.finish().await.unwrap();
        assert_eq!(log.sizes(), vec![20]);
        assert_eq!(
            stats,
            WriteStats {
                batches: 1,
                rows_updated: 20
            }
        );
    }

    #[tokio::test]
    async fn test_one_past_full_leaves_a_remainder_batch() {
        let log = Arc::new(BatchLog::default());
        let stats = write_all(&log, 21).await;
        assert_eq!(log.sizes(), vec![20, 1]);
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.rows_updated, 21);
    }

    #[tokio::test]
    async fn test_nothing_pushed_writes_nothing() {
        let log = Arc::new(BatchLog::default());
        let stats = write_all(&log, 0).await;
        assert!(log.sizes().is_empty());
        assert_eq!(stats, WriteStats::default());
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_treated_as_one() {
        let log = Arc::new(BatchLog::default());
        let mut writer = BatchWriter::new(log.clone(), 0);
        writer.push(text(1)).await.unwrap();
        writer.push(text(2)).await.unwrap();
        writer.finish().await.unwrap();
        assert_eq!(log.sizes(), vec![1, 1]);
    }
}
