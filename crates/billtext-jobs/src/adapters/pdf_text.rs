//! PdfText extraction adapter - extracts text from PDFs using `pdftotext` (poppler-utils).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::process::Command;
use tracing::{debug, warn};

use billtext_core::defaults::{
    EXTRACTION_CMD_TIMEOUT_SECS, LARGE_PDF_PAGE_THRESHOLD, PDF_BATCH_PAGES,
};
use billtext_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

use super::command::{probe, run_cmd_with_timeout};

/// Adapter for extracting text from PDF files using `pdftotext` (poppler-utils).
///
/// For large PDFs (> 100 pages), extraction is batched in 50-page chunks to
/// bound memory usage. Each `pdftotext` invocation is guarded by a per-command
/// timeout.
///
/// Scanned agendas often have no text layer; when extraction yields almost
/// nothing, `metadata["needs_ocr"]` is set and the extractor warns about the row.
pub struct PdfTextAdapter {
    timeout: Duration,
}

impl PdfTextAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PdfTextAdapter {
    fn default() -> Self {
        Self::new(Duration::from_secs(EXTRACTION_CMD_TIMEOUT_SECS))
    }
}

/// Parse `pdfinfo` output into a JSON metadata object.
fn parse_pdfinfo(output: &str) -> JsonValue {
    let mut metadata = serde_json::Map::new();

    for line in output.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase().replace(' ', "_");
            let value = value.trim();
            if !value.is_empty() {
                if key == "pages" {
                    if let Ok(pages) = value.parse::<u64>() {
                        metadata.insert(key, JsonValue::Number(pages.into()));
                        continue;
                    }
                }
                metadata.insert(key, JsonValue::String(value.to_string()));
            }
        }
    }

    JsonValue::Object(metadata)
}

/// Get page count from pdfinfo metadata, defaulting to 0.
fn page_count(metadata: &JsonValue) -> usize {
    metadata.get("pages").and_then(|v| v.as_u64()).unwrap_or(0) as usize
}

/// Inclusive 1-based page ranges covering `pages` in `batch`-sized steps.
fn page_batches(pages: usize, batch: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 1usize;
    while start <= pages {
        let end = (start + batch - 1).min(pages);
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}

#[async_trait]
impl ExtractionAdapter for PdfTextAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::PdfText
    }

    async fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        let header = tokio::fs::read(path).await?;
        if header.is_empty() {
            return Err(Error::Extraction(
                "Cannot extract text from empty PDF data".to_string(),
            ));
        }
        if header.len() < 4 || &header[0..4] != b"%PDF" {
            return Err(Error::Extraction(format!(
                "File '{}' is not a valid PDF (missing %PDF header)",
                path.display()
            )));
        }

        let pdfinfo_output =
            run_cmd_with_timeout(Command::new("pdfinfo").arg(path), self.timeout).await;

        let mut metadata = match pdfinfo_output {
            Ok(output) => parse_pdfinfo(&String::from_utf8_lossy(&output)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "pdfinfo failed, continuing without metadata");
                serde_json::json!({})
            }
        };

        let pages = page_count(&metadata);
        let content = if pages > LARGE_PDF_PAGE_THRESHOLD {
            debug!(path = %path.display(), pages, "Large PDF detected, extracting in batches");
            let mut content = Vec::new();
            for (first, last) in page_batches(pages, PDF_BATCH_PAGES) {
                let chunk = run_cmd_with_timeout(
                    Command::new("pdftotext")
                        .arg("-enc")
                        .arg("UTF-8")
                        .arg("-f")
                        .arg(first.to_string())
                        .arg("-l")
                        .arg(last.to_string())
                        .arg(path)
                        .arg("-"),
                    self.timeout,
                )
                .await?;
                content.extend_from_slice(&chunk);
            }
            content
        } else {
            run_cmd_with_timeout(
                Command::new("pdftotext")
                    .arg("-enc")
                    .arg("UTF-8")
                    .arg(path)
                    .arg("-"),
                self.timeout,
            )
            .await?
        };

        let trimmed_len = content
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .count();
        if let Some(obj) = metadata.as_object_mut() {
            if trimmed_len < 50 && pages > 0 {
                obj.insert("needs_ocr".to_string(), JsonValue::Bool(true));
            }
            obj.insert(
                "byte_count".to_string(),
                JsonValue::Number(content.len().into()),
            );
        }

        Ok(ExtractionResult { content, metadata })
    }

    async fn health_check(&self) -> Result<bool> {
        // pdftotext -v exits with 0 or 99 depending on the poppler version.
        Ok(probe("pdftotext", "-v", &[99]).await)
    }

    fn name(&self) -> &str {
        "pdf_text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(data: &[u8], suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(data).unwrap();
        file
    }

    #[test]
    fn test_pdf_text_strategy() {
        let adapter = PdfTextAdapter::default();
        assert_eq!(adapter.strategy(), ExtractionStrategy::PdfText);
        assert_eq!(adapter.name(), "pdf_text");
    }

    #[tokio::test]
    async fn test_pdf_text_health_check() {
        let adapter = PdfTextAdapter::default();
        // Passes whether or not poppler is installed
        assert!(adapter.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_pdf_text_empty_input() {
        let file = write_temp(b"", ".pdf");
        let err = PdfTextAdapter::default()
            .extract(file.path())
            .await
            .unwrap_err();
        assert!(err.is_row_scoped());
        assert!(err.to_string().contains("empty"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_pdf_text_invalid_pdf() {
        let file = write_temp(b"<html>Not Found</html>", ".pdf");
        let err = PdfTextAdapter::default()
            .extract(file.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a valid PDF"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_pdf_text_extraction() {
        let pdf_bytes = b"%PDF-1.0
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj

2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj

3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792]
   /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>
endobj

4 0 obj
<< /Length 44 >>
stream
BT /F1 12 Tf 100 700 Td (Hello World) Tj ET
endstream
endobj

5 0 obj
<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>
endobj

xref
0 6
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
0000000266 00000 n
0000000360 00000 n

trailer
<< /Size 6 /Root 1 0 R >>
startxref
434
%%EOF";

        let adapter = PdfTextAdapter::default();
        if !adapter.health_check().await.unwrap_or(false) {
            eprintln!("Skipping test_pdf_text_extraction: pdftotext not installed");
            return;
        }

        let file = write_temp(pdf_bytes, ".pdf");
        let result = adapter.extract(file.path()).await;
        assert!(result.is_ok(), "Extraction failed: {:?}", result.err());
        let extraction = result.unwrap();
        let text = String::from_utf8(extraction.content).unwrap();
        assert!(text.contains("Hello World"), "got: {}", text);
        assert!(extraction.metadata.get("byte_count").is_some());
    }

    #[test]
    fn test_pdfinfo_metadata_parsing() {
        let pdfinfo_output = "\
Title:          Ordinance O2024-1234
Author:         Office of the City Clerk
Producer:       Legistar
Pages:          42
Page size:      612 x 792 pts (letter)
";
        let metadata = parse_pdfinfo(pdfinfo_output);
        assert_eq!(metadata["title"], "Ordinance O2024-1234");
        assert_eq!(metadata["author"], "Office of the City Clerk");
        assert_eq!(metadata["pages"], 42);
        assert_eq!(metadata["page_size"], "612 x 792 pts (letter)");
    }

    #[test]
    fn test_pdfinfo_empty_output() {
        let metadata = parse_pdfinfo("");
        assert!(metadata.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_page_count_extraction() {
        assert_eq!(page_count(&serde_json::json!({"pages": 150})), 150);
        assert_eq!(page_count(&serde_json::json!({})), 0);
        assert_eq!(page_count(&serde_json::json!({"pages": "many"})), 0);
    }

    #[test]
    fn test_page_batches_cover_every_page() {
        assert_eq!(page_batches(120, 50), vec![(1, 50), (51, 100), (101, 120)]);
        assert_eq!(page_batches(50, 50), vec![(1, 50)]);
        assert!(page_batches(0, 50).is_empty());
    }
}
