//! Error types for the watch-and-analyze pipeline.
//!
//! Every per-file failure is an [`AnalysisError`]. The watcher boundary
//! collapses these into a logged [`ErrorRecord`] and keeps watching, so the
//! only error that ends the process is a failure to set the watcher up.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Failures talking to the model backend.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Connection refused, DNS failure, timeout or a broken body stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint answered 2xx but the body lacks the completion field.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            InferenceError::Protocol(err.to_string())
        } else {
            InferenceError::Transport(err.to_string())
        }
    }
}

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The file extension has no table loader.
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    /// The file could not be read or parsed as a table.
    #[error("Failed to load table: {0}")]
    Load(String),

    /// The model backend call failed; no output is written.
    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The filesystem watcher could not be created or attached.
    #[error("Watcher error: {0}")]
    Watch(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl From<notify::Error> for AnalysisError {
    fn from(err: notify::Error) -> Self {
        AnalysisError::Watch(err.to_string())
    }
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable code for logs and the JSON error record.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::Load(_) => "LOAD_ERROR",
            Self::Inference(_) => "INFERENCE_ERROR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Watch(_) => "WATCH_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the watcher can keep going after this error.
    ///
    /// Per-file failures are recoverable; configuration and watcher setup
    /// failures are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::Watch(_) => false,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => true,
        }
    }

    /// Collapse this error into the serializable per-file failure record.
    pub fn to_record(&self, file_name: impl Into<String>) -> ErrorRecord {
        ErrorRecord {
            file_name: file_name.into(),
            status: "error".to_string(),
            code: self.error_code().to_string(),
            error: self.to_string(),
        }
    }
}

/// Errors are serialized as `{code, message}`.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Failure outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub file_name: String,
    pub status: String,
    pub code: String,
    pub error: String,
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Io(e).with_context(context))
    }
}
