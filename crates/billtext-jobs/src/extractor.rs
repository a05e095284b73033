//! Fetch-and-convert stage of the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use serde_json::Value as JsonValue;
use tempfile::TempDir;
use tracing::{debug, warn};

use billtext_core::defaults::SCRATCH_FILE_STEM;
use billtext_core::{
    DocumentFetcher, Error, ExtractedText, ExtractionStrategy, PendingAttachment, Result,
};

use crate::extraction::ExtractionRegistry;

/// Directory holding the run's scratch file.
///
/// A temporary directory is removed when the value drops; a configured
/// directory is left in place.
pub struct ScratchDir {
    dir: PathBuf,
    _temp: Option<TempDir>,
}

impl ScratchDir {
    /// Fresh per-run temporary directory.
    pub fn temporary() -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("billtext-").tempdir()?;
        Ok(Self {
            dir: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// Use `dir`, creating it if needed.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, _temp: None })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Scratch file path for an attachment with extension `ext`.
    pub fn path_for(&self, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", SCRATCH_FILE_STEM, ext))
    }
}

/// Lowercased extension of the URL's last path segment.
///
/// Query string and fragment are ignored.
pub fn url_extension(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.last()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Pick the scratch extension and converter for a downloaded attachment.
///
/// The URL's extension is used when it names a supported format; otherwise
/// the format is sniffed from the body's magic number.
pub fn resolve_format(url: &str, body: &[u8]) -> Result<(String, ExtractionStrategy)> {
    let from_url = url_extension(url);
    if let Some(ext) = &from_url {
        if let Some(strategy) = ExtractionStrategy::from_extension(ext) {
            return Ok((ext.clone(), strategy));
        }
    }

    if let Some(kind) = infer::get(body) {
        let ext = kind.extension();
        if let Some(strategy) = ExtractionStrategy::from_extension(ext) {
            debug!(url, sniffed = ext, "Format resolved from content");
            return Ok((ext.to_string(), strategy));
        }
    }

    Err(Error::Extraction(format!(
        "unsupported format: {} (extension: {})",
        url,
        from_url.as_deref().unwrap_or("none")
    )))
}

/// Decode converter output as UTF-8.
///
/// NUL characters are dropped since PostgreSQL text columns reject them.
pub fn decode_text(content: Vec<u8>) -> Result<String> {
    let text = String::from_utf8(content)
        .map_err(|e| Error::Extraction(format!("Converter output is not valid UTF-8: {}", e)))?;
    if text.contains('\0') {
        Ok(text.replace('\0', ""))
    } else {
        Ok(text)
    }
}

/// Whether converter metadata reports a document with no usable text layer.
pub fn needs_ocr(metadata: &JsonValue) -> bool {
    metadata
        .get("needs_ocr")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false)
}

/// Result of converting one selected row.
#[derive(Debug)]
pub enum RowOutcome {
    Converted(ExtractedText),
    /// The row could not be fetched or converted. It keeps its NULL text.
    Failed {
        attachment: PendingAttachment,
        error: Error,
    },
}

/// Downloads attachments and converts them to plain text.
pub struct AttachmentExtractor {
    fetcher: Arc<dyn DocumentFetcher>,
    registry: ExtractionRegistry,
    scratch: ScratchDir,
}

impl AttachmentExtractor {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        registry: ExtractionRegistry,
        scratch: ScratchDir,
    ) -> Self {
        Self {
            fetcher,
            registry,
            scratch,
        }
    }

    /// Fetch one attachment, convert it, and return its text.
    pub async fn extract(&self, attachment: &PendingAttachment) -> Result<ExtractedText> {
        let body = self.fetcher.fetch(&attachment.url).await?;
        let (ext, strategy) = resolve_format(&attachment.url, &body)?;

        let path = self.scratch.path_for(&ext);
        tokio::fs::write(&path, &body).await?;

        let result = self.registry.extract(strategy, &path).await?;
        if needs_ocr(&result.metadata) {
            warn!(
                subsystem = "jobs",
                component = "extractor",
                attachment_id = attachment.id,
                url = %attachment.url,
                "Attachment has no text layer, stored text will be near empty"
            );
        }
        let plain_text = decode_text(result.content)?;

        debug!(
            subsystem = "jobs",
            component = "extractor",
            attachment_id = attachment.id,
            strategy = %strategy,
            bytes = body.len(),
            chars = plain_text.len(),
            metadata = %result.metadata,
            "Attachment converted"
        );

        Ok(ExtractedText {
            id: attachment.id,
            plain_text,
        })
    }

    /// Lazily convert a stream of selected rows, one at a time, in order.
    ///
    /// Selection errors end the stream as `Err`; a row that fails to convert
    /// comes back as [`RowOutcome::Failed`] together with the row itself.
    pub fn convert<'a>(
        &'a self,
        rows: BoxStream<'a, Result<PendingAttachment>>,
    ) -> BoxStream<'a, Result<RowOutcome>> {
        rows.and_then(move |row| async move {
            Ok::<_, Error>(match self.extract(&row).await {
                Ok(text) => RowOutcome::Converted(text),
                Err(error) => RowOutcome::Failed {
                    attachment: row,
                    error,
                },
            })
        })
        .boxed()
    }
}
