//! Spreadsheet extraction adapter - renders Excel and OpenDocument workbooks as text.
//!
//! Workbooks are read in-process with calamine, so no converter needs to be
//! installed. Each sheet becomes a `Sheet: <name>` heading followed by one
//! line per non-empty row, cells joined with ` | `.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use calamine::{Data, Range, Reader};
use serde_json::json;
use tracing::debug;

use billtext_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

pub struct SpreadsheetAdapter;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}

fn render_sheet(name: &str, range: &Range<Data>) -> String {
    let mut text = format!("Sheet: {}\n", name);
    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        text.push_str(&cells.join(" | "));
        text.push('\n');
    }
    text
}

/// Render every readable sheet of the workbook in `data`.
///
/// Returns the text and the number of sheets rendered.
fn render_workbook(data: Vec<u8>) -> Result<(String, usize)> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| Error::Extraction(format!("Cannot open spreadsheet: {}", e)))?;

    let mut text = String::new();
    let mut sheets = 0;
    for name in workbook.sheet_names().to_vec() {
        match workbook.worksheet_range(&name) {
            Ok(range) => {
                text.push_str(&render_sheet(&name, &range));
                text.push('\n');
                sheets += 1;
            }
            Err(e) => debug!(sheet = %name, error = %e, "Skipping unreadable sheet"),
        }
    }
    Ok((text, sheets))
}

#[async_trait]
impl ExtractionAdapter for SpreadsheetAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Spreadsheet
    }

    async fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        let data = tokio::fs::read(path).await?;
        if data.is_empty() {
            return Err(Error::Extraction(
                "Cannot convert empty spreadsheet".to_string(),
            ));
        }

        let (text, sheets) = render_workbook(data)?;
        let content = text.into_bytes();

        Ok(ExtractionResult {
            metadata: json!({
                "converter": "calamine",
                "sheets": sheets,
                "byte_count": content.len(),
            }),
            content,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true) // Built in
    }

    fn name(&self) -> &str {
        "spreadsheet"
    }
}
