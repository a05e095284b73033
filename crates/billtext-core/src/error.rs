//! Error types for billtext.

use thiserror::Error;

/// Result type alias using billtext's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for billtext operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection or pool failure (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Selecting pending attachments or reading the watermark failed
    #[error("Selection error: {0}")]
    Selection(#[source] sqlx::Error),

    /// Downloading an attachment failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Converting a downloaded attachment to text failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Committing a batch of extracted text failed (batch rolled back)
    #[error("Write error: {0}")]
    Write(#[source] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error concerns a single attachment rather than the job.
    ///
    /// Row-scoped errors are the ones a skip policy may log and step over;
    /// everything else aborts the run.
    pub fn is_row_scoped(&self) -> bool {
        matches!(self, Error::Fetch(_) | Error::Extraction(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Fetch(e.to_string())
    }
}
