//! TextNative extraction adapter - handles plain text files.

use std::path::Path;

use async_trait::async_trait;

use billtext_core::{ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

/// Adapter for attachments that are already text.
///
/// Clerk offices still publish Latin-1 and Windows-1252 `.txt` files, so
/// bytes that are not UTF-8 are converted lossily and flagged as such in the
/// metadata. Output is always valid UTF-8.
pub struct TextNativeAdapter;

#[async_trait]
impl ExtractionAdapter for TextNativeAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::TextNative
    }

    async fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        let raw = tokio::fs::read(path).await?;
        let byte_count = raw.len();

        let (content, lossy) = match String::from_utf8(raw) {
            Ok(text) => (text.into_bytes(), false),
            Err(e) => {
                let text = String::from_utf8_lossy(e.as_bytes()).into_owned();
                (text.into_bytes(), true)
            }
        };

        Ok(ExtractionResult {
            metadata: serde_json::json!({
                "byte_count": byte_count,
                "lossy": lossy,
            }),
            content,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true) // No external dependencies
    }

    fn name(&self) -> &str {
        "text_native"
    }
}
