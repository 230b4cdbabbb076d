//! Statistics over a loaded table.
//!
//! [`extract_basic_stats`] is the input to both prompts. The outlier and
//! correlation helpers back the `profile` command and never reach the model.

pub mod correlation;
pub mod outliers;
mod statistics;

pub use correlation::{CorrelationMatrix, CorrelationMethod, significant_correlations};
pub use outliers::{OutlierMethod, detect_outliers};

use crate::error::Result;
use crate::types::BasicStats;
use crate::utils::{dtype_name, is_numeric_dtype, non_null_f64_values};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Compute row/column counts, dtypes, missing values and numeric summaries.
///
/// An empty table (no rows or no columns) yields an empty
/// `numeric_summary` instead of failing.
pub fn extract_basic_stats(df: &DataFrame) -> Result<BasicStats> {
    let (row_count, column_count) = df.shape();

    let mut columns = Vec::with_capacity(column_count);
    let mut dtypes = BTreeMap::new();
    let mut missing_values = BTreeMap::new();
    let mut numeric_summary = BTreeMap::new();

    for col in df.get_columns() {
        let name = col.name().to_string();
        dtypes.insert(name.clone(), dtype_name(col.dtype()));
        missing_values.insert(name.clone(), col.null_count());

        if row_count > 0 && is_numeric_dtype(col.dtype()) {
            let values = non_null_f64_values(col.as_materialized_series())?;
            numeric_summary.insert(name.clone(), statistics::summarize(&values));
        }

        columns.push(name);
    }

    debug!(
        rows = row_count,
        columns = column_count,
        numeric = numeric_summary.len(),
        "Extracted basic statistics"
    );

    Ok(BasicStats {
        row_count,
        column_count,
        columns,
        dtypes,
        missing_values,
        numeric_summary,
    })
}
