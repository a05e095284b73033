//! The attachment text conversion job.
//!
//! Selector, extractor and writer are chained as one lazy stream:
//!
//! ```text
//! text_watermark ─► SelectionMode ─► select_pending ─► convert ─► BatchWriter
//! ```

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tracing::{error, info, warn};

use billtext_core::defaults::{BATCH_SIZE, RECENT_LIMIT};
use billtext_core::{
    AttachmentRepository, Error, FailurePolicy, JobSummary, Result, SelectionMode,
};

use crate::extractor::{AttachmentExtractor, RowOutcome};
use crate::writer::BatchWriter;

/// Per-run options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOptions {
    /// Convert every eligible row regardless of the watermark.
    pub update_all: bool,
    pub batch_size: usize,
    /// Row cap when no row has text yet.
    pub recent_limit: i64,
    pub failure_policy: FailurePolicy,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            update_all: false,
            batch_size: BATCH_SIZE,
            recent_limit: RECENT_LIMIT,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl JobOptions {
    pub fn with_update_all(mut self, update_all: bool) -> Self {
        self.update_all = update_all;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_recent_limit(mut self, recent_limit: i64) -> Self {
        self.recent_limit = recent_limit;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidInput(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.recent_limit <= 0 {
            return Err(Error::InvalidInput(
                "recent_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Converts pending attachments to text and stores it.
pub struct ConversionJob {
    repo: Arc<dyn AttachmentRepository>,
    extractor: AttachmentExtractor,
    options: JobOptions,
}

impl ConversionJob {
    pub fn new(
        repo: Arc<dyn AttachmentRepository>,
        extractor: AttachmentExtractor,
        options: JobOptions,
    ) -> Self {
        Self {
            repo,
            extractor,
            options,
        }
    }

    /// Run one pass over the pending attachments.
    ///
    /// Under [`FailurePolicy::Abort`] the first error ends the run; batches
    /// committed before it stay committed. Under [`FailurePolicy::Skip`] fetch
    /// and extraction failures are logged and the row is left for the next run.
    pub async fn run(&self) -> Result<JobSummary> {
        self.options.validate()?;
        let start = Instant::now();

        info!(
            subsystem = "jobs",
            component = "conversion",
            op = "run",
            update_all = self.options.update_all,
            batch_size = self.options.batch_size,
            failure_policy = ?self.options.failure_policy,
            "Converting document to plain text"
        );

        let watermark = self.repo.text_watermark().await?;
        let mode = SelectionMode::resolve(
            self.options.update_all,
            watermark,
            self.options.recent_limit,
        );
        info!(
            subsystem = "jobs",
            component = "conversion",
            mode = %mode,
            "Selection mode resolved"
        );

        let mut summary = JobSummary::default();
        let mut writer = BatchWriter::new(self.repo.clone(), self.options.batch_size);
        let mut results = self.extractor.convert(self.repo.select_pending(mode));

        while let Some(outcome) = results.next().await {
            summary.processed += 1;
            match outcome? {
                RowOutcome::Converted(text) => {
                    summary.converted += 1;
                    writer.push(text).await?;
                }
                RowOutcome::Failed { attachment, error }
                    if error.is_row_scoped()
                        && self.options.failure_policy == FailurePolicy::Skip =>
                {
                    summary.skipped += 1;
                    warn!(
                        subsystem = "jobs",
                        component = "conversion",
                        attachment_id = attachment.id,
                        url = %attachment.url,
                        error = %error,
                        "Skipping attachment"
                    );
                }
                RowOutcome::Failed { attachment, error } => {
                    error!(
                        subsystem = "jobs",
                        component = "conversion",
                        attachment_id = attachment.id,
                        url = %attachment.url,
                        error = %error,
                        "Attachment conversion failed, stopping run"
                    );
                    return Err(error);
                }
            }
        }
        drop(results);

        let stats = writer.finish().await?;
        summary.batches = stats.batches;
        summary.rows_updated = stats.rows_updated;
        summary.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            subsystem = "jobs",
            component = "conversion",
            op = "run",
            processed = summary.processed,
            converted = summary.converted,
            skipped = summary.skipped,
            batches = summary.batches,
            rows_updated = summary.rows_updated,
            duration_ms = summary.duration_ms,
            "SUCCESS"
        );

        Ok(summary)
    }
}
