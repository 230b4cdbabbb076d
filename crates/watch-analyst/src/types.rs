use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Descriptive summary of one numeric column.
///
/// `mean`, `std` and the quantiles are `None` when they are undefined
/// (no non-null values, or a single value for `std`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub q50: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Statistics derived from a loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub row_count: usize,
    pub column_count: usize,
    /// Column names in the table's native order.
    pub columns: Vec<String>,
    pub dtypes: BTreeMap<String, String>,
    pub missing_values: BTreeMap<String, usize>,
    /// Only numeric columns; empty when the table has no rows.
    pub numeric_summary: BTreeMap<String, NumericSummary>,
}

/// Structured recommendations returned by the second model call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecommendationSet {
    #[serde(rename = "datenverarbeitung")]
    pub data_processing: Vec<String>,
    #[serde(rename = "weitere_analysen")]
    pub further_analyses: Vec<String>,
    #[serde(rename = "visualisierungen")]
    pub visualizations: Vec<String>,
    pub actionable_insights: Vec<String>,
}

/// Everything one processing run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_name: String,
    pub basic_stats: BasicStats,
    pub narrative: String,
    pub recommendations: RecommendationSet,
    /// Whether `recommendations` is the parse-failure placeholder.
    pub degraded: bool,
}

/// Contents of `empfehlungen_{stem}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsDocument {
    pub file_name: String,
    pub status: String,
    pub timestamp: String,
    pub basic_stats: BasicStats,
    pub empfehlungen: RecommendationSet,
}

/// A finished run: the result plus where both artifacts landed.
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    pub result: AnalysisResult,
    pub report_path: PathBuf,
    pub recommendations_path: PathBuf,
}

/// Outcome of a document analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub summary: String,
    pub file_path: String,
    pub model_used: String,
}

/// Outcome of a code review call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReview {
    pub suggestions: String,
    pub file_analyzed: String,
    pub model_used: String,
}
