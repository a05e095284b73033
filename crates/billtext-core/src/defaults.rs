//! Centralized default constants for billtext.
//!
//! All crates and the binary reference these constants instead of defining
//! their own magic numbers. Organized by pipeline stage.

// =============================================================================
// DATABASE
// =============================================================================

/// Default connection string when `DATABASE_URL` is not set.
pub const DATABASE_URL: &str = "postgres://localhost/councilmatic";

/// Table holding bill documents (attachments and versions).
pub const ATTACHMENT_TABLE: &str = "councilmatic_core_billdocument";

/// Session time zone applied to every pooled connection.
pub const TIME_ZONE: &str = "UTC";

/// One connection streams the selection while the other commits batches.
pub const POOL_MAX_CONNECTIONS: u32 = 2;

// =============================================================================
// SELECTION
// =============================================================================

/// Row cap for a run that has no watermark to work from.
pub const RECENT_LIMIT: i64 = 10;

// =============================================================================
// WRITING
// =============================================================================

/// Extraction results committed per transaction.
pub const BATCH_SIZE: usize = 20;

// =============================================================================
// EXTRACTION
// =============================================================================

/// Per-command timeout for external extraction tools (seconds).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 60;

/// Page threshold for batch PDF extraction.
pub const LARGE_PDF_PAGE_THRESHOLD: usize = 100;

/// Pages per batch for large PDF extraction.
pub const PDF_BATCH_PAGES: usize = 50;

/// File stem of the per-run scratch file; the extension is appended per row.
pub const SCRATCH_FILE_STEM: &str = "attachment";

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Environment variable for the database connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable for the target table.
pub const ENV_TABLE: &str = "BILLTEXT_TABLE";

/// Environment variable for the session time zone.
pub const ENV_TIME_ZONE: &str = "BILLTEXT_TIME_ZONE";

/// Environment variable for the write batch size.
pub const ENV_BATCH_SIZE: &str = "BILLTEXT_BATCH_SIZE";

/// Environment variable for the no-watermark row cap.
pub const ENV_RECENT_LIMIT: &str = "BILLTEXT_RECENT_LIMIT";

/// Environment variable for the scratch directory.
pub const ENV_SCRATCH_DIR: &str = "BILLTEXT_SCRATCH_DIR";

/// Environment variable for the HTTP timeout (unset means no timeout).
pub const ENV_FETCH_TIMEOUT_SECS: &str = "BILLTEXT_FETCH_TIMEOUT_SECS";

/// Environment variable for the per-command extraction timeout.
pub const ENV_EXTRACTION_TIMEOUT_SECS: &str = "BILLTEXT_EXTRACTION_TIMEOUT_SECS";
