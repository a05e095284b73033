//! Core traits for the conversion pipeline.
//!
//! These traits sit at the pipeline's seams: the database, the network, and
//! the external converters. The job is written against them so each side can
//! be swapped for a test double.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{ExtractedText, ExtractionStrategy, PendingAttachment, Result, SelectionMode};

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

/// Read and update access to the bill document table.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Latest `updated_at` among rows that already carry text, if any.
    async fn text_watermark(&self) -> Result<Option<DateTime<Utc>>>;

    /// Stream eligible attachments for `mode`, most recently updated first.
    ///
    /// The stream is lazy; rows are pulled from the database as it is polled.
    fn select_pending(&self, mode: SelectionMode) -> BoxStream<'_, Result<PendingAttachment>>;

    /// Set `full_text` for every entry in one transaction.
    ///
    /// Returns the number of rows the database reports as updated.
    async fn write_batch(&self, batch: &[ExtractedText]) -> Result<u64>;
}

// =============================================================================
// NETWORK TRAITS
// =============================================================================

/// Downloads attachment bytes.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the body at `url`. Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

// =============================================================================
// EXTRACTION ADAPTER TRAITS
// =============================================================================

/// Raw output of an extraction adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Converter output, not yet decoded.
    #[serde(skip)]
    pub content: Vec<u8>,
    /// Metadata about the extraction (format-specific).
    pub metadata: JsonValue,
}

/// Adapter for converting a document on disk to plain text.
///
/// Each adapter handles one extraction strategy. Adapters are registered in an
/// `ExtractionRegistry` and dispatched by the strategy derived from the file
/// extension.
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    /// The extraction strategy this adapter handles.
    fn strategy(&self) -> ExtractionStrategy;

    /// Convert the file at `path`.
    async fn extract(&self, path: &Path) -> Result<ExtractionResult>;

    /// Check if the adapter's external dependencies are available.
    async fn health_check(&self) -> Result<bool>;

    /// Human-readable name of this adapter.
    fn name(&self) -> &str;
}
