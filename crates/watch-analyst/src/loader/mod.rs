//! Table loading by file extension.
//!
//! | Extension                          | Reader                       |
//! |------------------------------------|------------------------------|
//! | `.csv`                             | polars CSV reader            |
//! | `.parquet`                         | polars Parquet reader        |
//! | `.xlsx`, `.xls`, `.xlsm`, `.ods`   | calamine (`excel` feature)   |
//!
//! Anything else fails with [`AnalysisError::UnsupportedFormat`]; reader
//! failures become [`AnalysisError::Load`] carrying the reader's message.

mod csv;
#[cfg(feature = "excel")]
mod excel;

use crate::error::{AnalysisError, Result};
use crate::utils::dotted_extension;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Extensions handled by the Excel reader.
pub const EXCEL_EXTENSIONS: [&str; 4] = [".xlsx", ".xls", ".xlsm", ".ods"];

/// Whether [`load_table`] has a reader for this path's extension.
pub fn is_supported(path: &Path) -> bool {
    let ext = dotted_extension(path).to_lowercase();
    match ext.as_str() {
        ".csv" | ".parquet" => true,
        e if EXCEL_EXTENSIONS.contains(&e) => cfg!(feature = "excel"),
        _ => false,
    }
}

/// Load a file as a table, choosing the reader from its extension.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    let ext = dotted_extension(path);
    debug!(path = %path.display(), extension = %ext, "Loading table");

    let df = match ext.to_lowercase().as_str() {
        ".csv" => csv::load_csv(path)?,
        ".parquet" => load_parquet(path)?,
        #[cfg(feature = "excel")]
        e if EXCEL_EXTENSIONS.contains(&e) => excel::load_workbook(path)?,
        _ => return Err(AnalysisError::UnsupportedFormat(ext)),
    };

    debug!(shape = ?df.shape(), "Table loaded");
    Ok(df)
}

fn load_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| AnalysisError::Load(e.to_string()))?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| AnalysisError::Load(e.to_string()))
}
