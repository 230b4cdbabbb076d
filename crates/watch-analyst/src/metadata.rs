//! Filesystem metadata for an input file.

use crate::error::{Result, ResultExt};
use crate::utils::dotted_extension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// RFC 3339 timestamps; `None` when the platform does not report them.
    pub created: Option<String>,
    pub modified: Option<String>,
    pub accessed: Option<String>,
    /// Lowercased, with leading dot; empty when the file has none.
    pub extension: String,
    /// Guessed from the extension.
    pub mime_type: Option<String>,
}

pub fn file_metadata(path: &Path) -> Result<FileMetadata> {
    let meta = std::fs::metadata(path).context(format!("Failed to stat {}", path.display()))?;

    Ok(FileMetadata {
        path: path.display().to_string(),
        size: meta.len(),
        created: rfc3339(meta.created()),
        modified: rfc3339(meta.modified()),
        accessed: rfc3339(meta.accessed()),
        extension: dotted_extension(path).to_lowercase(),
        mime_type: mime_guess::from_path(path).first_raw().map(str::to_string),
    })
}

fn rfc3339(time: std::io::Result<SystemTime>) -> Option<String> {
    time.ok().map(|t| DateTime::<Utc>::from(t).to_rfc3339())
}
