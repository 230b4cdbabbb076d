//! Watch-and-analyze library.
//!
//! Watches a directory for new tabular files, summarizes each one, asks a
//! locally hosted model (Ollama) for a narrative analysis plus structured
//! recommendations, and writes both next to each other in an output
//! directory.
//!
//! # Overview
//!
//! - **Loading**: CSV, Parquet and (with the `excel` feature) Excel/ODS via [`loader`]
//! - **Statistics**: counts, dtypes, missing values, numeric summaries via [`profiler`]
//! - **Inference**: one blocking `POST /api/generate` per prompt via [`ai::OllamaClient`]
//! - **Parsing**: lossy recommendations parser with a fixed fallback in [`recommendations`]
//! - **Outputs**: `analyse_{stem}.txt` and `empfehlungen_{stem}.json` via [`reporting`]
//! - **Watching**: one file at a time, each path at most once, via [`DirectoryWatcher`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use watch_analyst::ai::{OllamaClient, OllamaConfig};
//! use watch_analyst::{AppConfig, CancellationToken, DirectoryWatcher, FileProcessor, ReportWriter};
//!
//! let config = AppConfig::load("config/settings.yaml".as_ref())?;
//! config.ensure_directories()?;
//!
//! let client = Arc::new(OllamaClient::with_config(OllamaConfig::from(&config.model_settings))?);
//! let processor = FileProcessor::new(client, ReportWriter::new(&config.output_directory));
//!
//! let token = CancellationToken::new();
//! DirectoryWatcher::new(&config.watch_directory, processor).run(&token)?;
//! ```
//!
//! A single file can be processed without the watcher:
//!
//! ```rust,ignore
//! let output = processor.process("data/umsatz.csv".as_ref())?;
//! println!("{}", output.report_path.display());
//! ```

pub mod ai;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod processor;
pub mod profiler;
pub mod prompts;
pub mod recommendations;
pub mod reporting;
pub mod types;
pub mod utils;
pub mod watcher;

// Re-exports for convenient access
pub use analyzer::TextAnalyzer;
pub use config::{AppConfig, AppConfigBuilder, ConfigError, ModelSettings};
pub use error::{AnalysisError, ErrorRecord, InferenceError, Result, ResultExt};
pub use loader::load_table;
pub use metadata::{FileMetadata, file_metadata};
pub use processor::FileProcessor;
pub use profiler::{
    CorrelationMatrix, CorrelationMethod, OutlierMethod, detect_outliers, extract_basic_stats,
    significant_correlations,
};
pub use reporting::ReportWriter;
pub use types::{
    AnalysisResult, BasicStats, CodeReview, DocumentAnalysis, NumericSummary, ProcessedOutput,
    RecommendationSet, RecommendationsDocument,
};
pub use watcher::{
    CancellationToken, DirectoryWatcher, EventOutcome, FileHandler, ProcessedFileSet, WatchEvent,
};
