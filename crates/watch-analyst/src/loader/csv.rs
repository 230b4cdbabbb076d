//! CSV loading with a cleanup fallback.

use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Rows sampled for schema inference.
const INFER_SCHEMA_ROWS: usize = 100;

/// Load CSV, retrying once on pre-cleaned content if the reader rejects it.
pub(super) fn load_csv(path: &Path) -> Result<DataFrame> {
    let first_error = match CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard CSV loading failed: {}", e);
            e
        }
    };

    let content =
        std::fs::read_to_string(path).map_err(|e| AnalysisError::Load(e.to_string()))?;
    let cleaned = clean_csv_content(&content);
    if cleaned.is_empty() {
        return Err(AnalysisError::Load(first_error.to_string()));
    }

    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .map_err(|e| AnalysisError::Load(e.to_string()))
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
