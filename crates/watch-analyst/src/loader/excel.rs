//! Excel/ODS loading via calamine.
//!
//! Only the first worksheet is read. The first row is the header; column
//! types are inferred from the non-empty cells below it.

use crate::error::{AnalysisError, Result};
use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::*;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Bool,
    Text,
}

pub(super) fn load_workbook(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path).map_err(|e| AnalysisError::Load(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AnalysisError::Load("workbook has no worksheets".to_string()))?
        .map_err(|e| AnalysisError::Load(e.to_string()))?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell {
                Data::Empty => format!("column_{}", idx),
                other => other.to_string(),
            })
            .collect(),
        None => return Ok(DataFrame::empty()),
    };

    let body: Vec<&[Data]> = rows.collect();
    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            build_column(name, &cells)
        })
        .collect::<Vec<Column>>();

    DataFrame::new(columns).map_err(|e| AnalysisError::Load(e.to_string()))
}

fn cell_kind(cell: &Data) -> Option<CellKind> {
    match cell {
        Data::Empty => None,
        Data::Int(_) => Some(CellKind::Int),
        Data::Float(f) if fits_i64(*f) => Some(CellKind::Int),
        Data::Float(_) => Some(CellKind::Float),
        Data::Bool(_) => Some(CellKind::Bool),
        _ => Some(CellKind::Text),
    }
}

/// Whole-valued and inside the `i64` range, so the cast is exact.
fn fits_i64(f: f64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, hence the half-open range.
    f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f)
}

/// Widest kind needed to hold every non-empty cell.
fn column_kind(cells: &[&Data]) -> CellKind {
    let mut kind: Option<CellKind> = None;
    for cell in cells {
        let Some(next) = cell_kind(cell) else {
            continue;
        };
        kind = Some(match (kind, next) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(CellKind::Int), CellKind::Float) | (Some(CellKind::Float), CellKind::Int) => {
                CellKind::Float
            }
            _ => CellKind::Text,
        });
    }
    kind.unwrap_or(CellKind::Text)
}

fn build_column(name: &str, cells: &[&Data]) -> Column {
    let name: PlSmallStr = name.into();
    let series = match column_kind(cells) {
        CellKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellKind::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty => None,
                    other => Some(other.to_string()),
                })
                .collect();
            Series::new(name, values)
        }
    };
    Column::from(series)
}
