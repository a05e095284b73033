//! WordLegacy extraction adapter - converts Word 97-2003 `.doc` files with `antiword`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::process::Command;

use billtext_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use billtext_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

use super::command::{probe, run_cmd_with_timeout};

/// OLE2 compound document signature shared by all binary Office formats.
const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

pub struct WordLegacyAdapter {
    timeout: Duration,
}

impl WordLegacyAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for WordLegacyAdapter {
    fn default() -> Self {
        Self::new(Duration::from_secs(EXTRACTION_CMD_TIMEOUT_SECS))
    }
}

#[async_trait]
impl ExtractionAdapter for WordLegacyAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::WordLegacy
    }

    async fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        let data = tokio::fs::read(path).await?;
        if data.is_empty() {
            return Err(Error::Extraction(
                "Cannot convert empty document".to_string(),
            ));
        }
        if !data.starts_with(&OLE2_MAGIC) {
            return Err(Error::Extraction(format!(
                "File '{}' is not a Word 97-2003 document",
                path.display()
            )));
        }

        // -m UTF-8.txt selects antiword's UTF-8 output mapping; -w 0 disables wrapping
        let content = run_cmd_with_timeout(
            Command::new("antiword")
                .arg("-m")
                .arg("UTF-8.txt")
                .arg("-w")
                .arg("0")
                .arg(path),
            self.timeout,
        )
        .await?;

        Ok(ExtractionResult {
            metadata: json!({
                "converter": "antiword",
                "byte_count": content.len(),
            }),
            content,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        // antiword has no version flag; with no arguments it prints usage and exits 1
        Ok(probe("antiword", "-h", &[0, 1]).await)
    }

    fn name(&self) -> &str {
        "word_legacy"
    }
}
