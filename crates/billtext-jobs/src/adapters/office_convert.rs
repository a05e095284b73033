//! OfficeConvertAdapter - converts office and markup documents to plain text using pandoc.
//!
//! Supports: docx, pptx, odt, rtf, epub, html

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::process::Command;
use tracing::debug;

use billtext_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use billtext_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

use super::command::{probe, run_cmd_with_timeout};

pub struct OfficeConvertAdapter {
    timeout: Duration,
}

impl OfficeConvertAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for OfficeConvertAdapter {
    fn default() -> Self {
        Self::new(Duration::from_secs(EXTRACTION_CMD_TIMEOUT_SECS))
    }
}

/// Determine the pandoc input format from the file extension.
fn pandoc_input_format(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "docx" => Some("docx"),
        "pptx" => Some("pptx"),
        "odt" => Some("odt"),
        "rtf" => Some("rtf"),
        "epub" => Some("epub"),
        "html" | "htm" => Some("html"),
        _ => None,
    }
}

#[async_trait]
impl ExtractionAdapter for OfficeConvertAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::OfficeConvert
    }

    async fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        let format = pandoc_input_format(path).ok_or_else(|| {
            Error::Extraction(format!(
                "No pandoc input format for '{}'",
                path.display()
            ))
        })?;

        let size = tokio::fs::metadata(path).await?.len();
        if size == 0 {
            return Err(Error::Extraction(
                "Cannot convert empty document".to_string(),
            ));
        }

        debug!(path = %path.display(), format, "Converting with pandoc");

        // pandoc -f FORMAT -t plain --wrap=none INPUT
        let content = run_cmd_with_timeout(
            Command::new("pandoc")
                .arg("-f")
                .arg(format)
                .arg("-t")
                .arg("plain")
                .arg("--wrap=none")
                .arg(path),
            self.timeout,
        )
        .await?;

        Ok(ExtractionResult {
            metadata: json!({
                "format": format,
                "byte_count": content.len(),
                "converter": "pandoc",
            }),
            content,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(probe("pandoc", "--version", &[]).await)
    }

    fn name(&self) -> &str {
        "office_convert"
    }
}
