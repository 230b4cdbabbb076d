use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::{AnalysisResult, RecommendationsDocument};
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Timestamp format in the text report header.
const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Width of the rule line under the header.
const RULE_WIDTH: usize = 80;

pub fn report_file_name(stem: &str) -> String {
    format!("analyse_{stem}.txt")
}

pub fn recommendations_file_name(stem: &str) -> String {
    format!("empfehlungen_{stem}.json")
}

/// Render the human-readable report.
pub fn render_text_report(file_name: &str, timestamp: &DateTime<Local>, narrative: &str) -> String {
    format!(
        "Analyse für: {file_name}\nZeitpunkt: {}\n\n{}\n\nDATENANALYSE\n\n{narrative}",
        timestamp.format(HEADER_TIME_FORMAT),
        "=".repeat(RULE_WIDTH),
    )
}

/// Writes both artifacts of a run into one output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `analyse_{stem}.txt` and `empfehlungen_{stem}.json`.
    ///
    /// Both files are first written under staging names in the output
    /// directory and only renamed into place once both writes succeeded.
    /// Existing files with the same names are overwritten. On any failure
    /// neither final file is left behind.
    pub fn write_outputs(
        &self,
        stem: &str,
        result: &AnalysisResult,
        timestamp: DateTime<Local>,
    ) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(&self.output_dir).context("Failed to create output directory")?;

        let document = RecommendationsDocument {
            file_name: result.file_name.clone(),
            status: "success".to_string(),
            timestamp: timestamp.to_rfc3339(),
            basic_stats: result.basic_stats.clone(),
            empfehlungen: result.recommendations.clone(),
        };
        // Serialize before touching the disk so a serializer error leaves nothing behind.
        let json = serde_json::to_string_pretty(&document)?;
        let text = render_text_report(&result.file_name, &timestamp, &result.narrative);

        let report_path = self.output_dir.join(report_file_name(stem));
        let recommendations_path = self.output_dir.join(recommendations_file_name(stem));
        let report_staging = staging_path(&report_path);
        let recommendations_staging = staging_path(&recommendations_path);

        if let Err(e) = write_file(&report_staging, &text) {
            discard(&[&report_staging]);
            return Err(AnalysisError::Io(e).with_context("Failed to write text report"));
        }
        if let Err(e) = write_file(&recommendations_staging, &json) {
            discard(&[&report_staging, &recommendations_staging]);
            return Err(AnalysisError::Io(e).with_context("Failed to write recommendations"));
        }

        if let Err(e) = fs::rename(&report_staging, &report_path) {
            discard(&[&report_staging, &recommendations_staging]);
            return Err(AnalysisError::Io(e).with_context("Failed to publish text report"));
        }
        if let Err(e) = fs::rename(&recommendations_staging, &recommendations_path) {
            discard(&[&report_path, &recommendations_staging]);
            return Err(AnalysisError::Io(e).with_context("Failed to publish recommendations"));
        }

        info!("Report saved: {}", report_path.display());
        info!("Recommendations saved: {}", recommendations_path.display());

        Ok((report_path, recommendations_path))
    }
}

/// Hidden sibling used while a file is being written.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

fn discard(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not remove partial output")
            }
        }
    }
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()
}
