//! Domain models for bill attachments and the conversion pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary key of a bill document row.
pub type AttachmentId = i64;

// =============================================================================
// DOCUMENT RECORDS
// =============================================================================

/// Classification flag stored in the `document_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// A document attached to a bill (`'A'`). The only type the job converts.
    Attachment,
    /// A version of the bill text itself (`'V'`).
    Version,
}

impl DocumentType {
    /// Single-character code used in the database column.
    pub fn code(self) -> &'static str {
        match self {
            Self::Attachment => "A",
            Self::Version => "V",
        }
    }
}

/// A full bill document row, as maintained by the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: AttachmentId,
    pub url: String,
    pub document_type: DocumentType,
    pub full_text: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AttachmentRecord {
    /// Whether the row is a candidate for conversion at all.
    pub fn is_eligible(&self) -> bool {
        self.document_type == DocumentType::Attachment && self.full_text.is_none()
    }
}

/// A selected row awaiting conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingAttachment {
    pub id: AttachmentId,
    pub url: String,
}

/// Plain text extracted for one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub id: AttachmentId,
    pub plain_text: String,
}

// =============================================================================
// SELECTION
// =============================================================================

/// Which eligible rows a run should convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum SelectionMode {
    /// The most recently updated eligible rows, capped at `limit`.
    Recent { limit: i64 },
    /// Every eligible row updated at or after `watermark`.
    Since { watermark: DateTime<Utc> },
    /// Every eligible row.
    All,
}

impl SelectionMode {
    /// Pick the selection policy for a run.
    ///
    /// `update_all` wins over the watermark. Without a watermark (nothing has
    /// text yet) the run is capped at `recent_limit` rows.
    pub fn resolve(
        update_all: bool,
        watermark: Option<DateTime<Utc>>,
        recent_limit: i64,
    ) -> Self {
        match (update_all, watermark) {
            (true, _) => Self::All,
            (false, Some(watermark)) => Self::Since { watermark },
            (false, None) => Self::Recent {
                limit: recent_limit,
            },
        }
    }

    /// Whether a row passes this mode's filter (eligibility is checked separately).
    pub fn admits(&self, updated_at: DateTime<Utc>) -> bool {
        match self {
            Self::Since { watermark } => updated_at >= *watermark,
            Self::Recent { .. } | Self::All => true,
        }
    }

    /// Row cap, if the mode has one.
    pub fn limit(&self) -> Option<i64> {
        match self {
            Self::Recent { limit } => Some(*limit),
            Self::Since { .. } | Self::All => None,
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recent { limit } => write!(f, "recent(limit={})", limit),
            Self::Since { watermark } => write!(f, "since({})", watermark.to_rfc3339()),
            Self::All => write!(f, "all"),
        }
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Converter used for a downloaded attachment, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// PDF text layer via poppler's `pdftotext`
    PdfText,
    /// Legacy Word `.doc` via `antiword`
    WordLegacy,
    /// Office and markup documents via `pandoc`
    OfficeConvert,
    /// Excel and OpenDocument workbooks, read in-process
    Spreadsheet,
    /// Files that already are text
    TextNative,
}

impl ExtractionStrategy {
    /// Map a file extension (without the dot, any case) to a strategy.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::PdfText),
            "doc" => Some(Self::WordLegacy),
            "docx" | "pptx" | "odt" | "rtf" | "epub" | "html" | "htm" => {
                Some(Self::OfficeConvert)
            }
            "xlsx" | "xlsm" | "xls" | "ods" => Some(Self::Spreadsheet),
            "txt" | "text" | "csv" | "md" => Some(Self::TextNative),
            _ => None,
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PdfText => write!(f, "pdf_text"),
            Self::WordLegacy => write!(f, "word_legacy"),
            Self::OfficeConvert => write!(f, "office_convert"),
            Self::Spreadsheet => write!(f, "spreadsheet"),
            Self::TextNative => write!(f, "text_native"),
        }
    }
}

impl FromStr for ExtractionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf_text" | "pdftext" => Ok(Self::PdfText),
            "word_legacy" | "wordlegacy" | "antiword" => Ok(Self::WordLegacy),
            "office_convert" | "officeconvert" | "pandoc" => Ok(Self::OfficeConvert),
            "spreadsheet" | "calamine" => Ok(Self::Spreadsheet),
            "text_native" | "textnative" => Ok(Self::TextNative),
            _ => Err(format!("Invalid extraction strategy: {}", s)),
        }
    }
}

// =============================================================================
// JOB OUTCOME
// =============================================================================

/// What to do when a single attachment cannot be fetched or converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run at the first failure. Already committed batches stay.
    #[default]
    Abort,
    /// Log the failure, leave the row untouched, and continue.
    Skip,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    /// Rows pulled from the selection.
    pub processed: u64,
    /// Rows whose text was extracted and handed to the writer.
    pub converted: u64,
    /// Rows skipped under `FailurePolicy::Skip`.
    pub skipped: u64,
    /// Write transactions committed.
    pub batches: u64,
    /// Rows reported updated by the database.
    pub rows_updated: u64,
    pub duration_ms: u64,
}
