//! Pairwise correlations between numeric columns.

use crate::error::Result;
use crate::utils::{numeric_column_names, optional_f64_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default magnitude a correlation must exceed to be reported.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    /// Pearson over average ranks.
    Spearman,
}

/// Square correlation matrix over numeric columns.
///
/// `values[i][j]` is `None` when the coefficient is undefined or its
/// magnitude does not exceed the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub threshold: f64,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Coefficient between two named columns, if present and significant.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }

    /// Unordered pairs with a significant coefficient, off the diagonal.
    pub fn significant_pairs(&self) -> Vec<(String, String, f64)> {
        let mut pairs = Vec::new();
        for (i, row) in self.values.iter().enumerate() {
            for (j, value) in row.iter().enumerate().skip(i + 1) {
                if let Some(r) = value {
                    pairs.push((self.columns[i].clone(), self.columns[j].clone(), *r));
                }
            }
        }
        pairs
    }
}

/// Correlate every pair of numeric columns, masking `|r| <= threshold`.
///
/// Rows where either value is null are dropped per pair.
pub fn significant_correlations(
    df: &DataFrame,
    method: CorrelationMethod,
    threshold: f64,
) -> Result<CorrelationMatrix> {
    let columns = numeric_column_names(df);
    let mut data = Vec::with_capacity(columns.len());
    for name in &columns {
        let column = df.column(name)?;
        data.push(optional_f64_values(column.as_materialized_series())?);
    }

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pairwise(&data[i], &data[j], method)?.filter(|r| r.abs() > threshold);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    debug!(?method, threshold, columns = n, "Computed correlation matrix");

    Ok(CorrelationMatrix {
        method,
        threshold,
        columns,
        values,
    })
}

/// Coefficient over the rows where both values are present.
///
/// `None` for fewer than two complete rows or a constant side.
fn pairwise(
    a: &[Option<f64>],
    b: &[Option<f64>],
    method: CorrelationMethod,
) -> Result<Option<f64>> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();

    if xs.len() < 2 {
        return Ok(None);
    }

    let r = match method {
        CorrelationMethod::Pearson => {
            let x = Float64Chunked::from_vec("x".into(), xs);
            let y = Float64Chunked::from_vec("y".into(), ys);
            cov::pearson_corr(&x, &y)
        }
        CorrelationMethod::Spearman => spearman(xs, ys)?,
    };

    Ok(r.filter(|r| r.is_finite()).map(|r| r.clamp(-1.0, 1.0)))
}

fn spearman(xs: Vec<f64>, ys: Vec<f64>) -> Result<Option<f64>> {
    let pair = DataFrame::new(vec![
        Column::new("x".into(), xs),
        Column::new("y".into(), ys),
    ])?;

    let out = pair
        .lazy()
        .select([spearman_rank_corr(col("x"), col("y"), false).alias("r")])
        .collect()?;

    let r = out.column("r")?.cast(&DataType::Float64)?;
    Ok(r.as_materialized_series().f64()?.get(0))
}
