//! Outlier detection over numeric columns.

use super::statistics::{mean, quartiles, sample_std};
use crate::error::{AnalysisError, Result};
use crate::utils::{numeric_column_names, optional_f64_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Fence multiplier for the interquartile-range rule.
const IQR_FENCE: f64 = 1.5;

/// Absolute z-score above which a value is flagged.
const Z_SCORE_LIMIT: f64 = 3.0;

/// How outliers are detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
    #[default]
    Iqr,
    /// More than three sample standard deviations from the mean.
    ZScore,
}

/// Row indices of outliers per column.
///
/// `columns` defaults to every numeric column. Null cells are never flagged,
/// and the returned indices refer to the original row positions.
pub fn detect_outliers(
    df: &DataFrame,
    columns: Option<&[String]>,
    method: OutlierMethod,
) -> Result<BTreeMap<String, Vec<usize>>> {
    let targets = match columns {
        Some(names) => names.to_vec(),
        None => numeric_column_names(df),
    };

    let mut result = BTreeMap::new();
    for name in targets {
        let column = df
            .column(&name)
            .map_err(|_| AnalysisError::ColumnNotFound(name.clone()))?;
        let values = optional_f64_values(column.as_materialized_series())?;

        let indices = match method {
            OutlierMethod::Iqr => iqr_outliers(&values),
            OutlierMethod::ZScore => z_score_outliers(&values),
        };
        debug!(column = %name, ?method, count = indices.len(), "Outliers detected");
        result.insert(name, indices);
    }

    Ok(result)
}

fn iqr_outliers(values: &[Option<f64>]) -> Vec<usize> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some((q1, q3)) = quartiles(&present) else {
        return Vec::new();
    };
    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    flag(values, |v| v < lower || v > upper)
}

fn z_score_outliers(values: &[Option<f64>]) -> Vec<usize> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let (Some(mean), Some(std)) = (mean(&present), sample_std(&present)) else {
        return Vec::new();
    };
    if std == 0.0 {
        return Vec::new();
    }

    flag(values, |v| ((v - mean) / std).abs() > Z_SCORE_LIMIT)
}

fn flag(values: &[Option<f64>], is_outlier: impl Fn(f64) -> bool) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| match value {
            Some(v) if is_outlier(*v) => Some(idx),
            _ => None,
        })
        .collect()
}
