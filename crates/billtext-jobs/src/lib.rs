//! # billtext-jobs
//!
//! The attachment text conversion pipeline.
//!
//! This crate provides:
//! - HTTP download of attachments
//! - Converter adapters dispatched by file extension
//! - Batched, transactional writes of the extracted text
//! - The `ConversionJob` that chains the three stages
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use billtext_db::Database;
//! use billtext_jobs::{
//!     AttachmentExtractor, ConversionJob, ExtractionRegistry, HttpFetcher, JobOptions,
//!     ScratchDir,
//! };
//!
//! let db = Database::connect(url, PoolConfig::default(), table).await?;
//! let extractor = AttachmentExtractor::new(
//!     Arc::new(HttpFetcher::new(None)?),
//!     ExtractionRegistry::with_defaults(timeout),
//!     ScratchDir::temporary()?,
//! );
//! let summary = ConversionJob::new(Arc::new(db.attachments), extractor, JobOptions::default())
//!     .run()
//!     .await?;
//! ```

pub mod adapters;
pub mod config;
pub mod extraction;
pub mod extractor;
pub mod fetch;
pub mod job;
pub mod writer;

// Re-export core types
pub use billtext_core::*;

pub use adapters::{
    OfficeConvertAdapter, PdfTextAdapter, SpreadsheetAdapter, TextNativeAdapter, WordLegacyAdapter,
};
pub use config::{ConfigError, ConversionConfig};
pub use extraction::ExtractionRegistry;
pub use extractor::{
    decode_text, needs_ocr, resolve_format, url_extension, AttachmentExtractor, RowOutcome,
    ScratchDir,
};
pub use fetch::HttpFetcher;
pub use job::{ConversionJob, JobOptions};
pub use writer::{BatchWriter, WriteStats};
