//! File Processor: load, profile, prompt twice, parse, persist.

use crate::ai::InferenceClient;
use crate::error::{Result, ResultExt};
use crate::loader::load_table;
use crate::profiler::extract_basic_stats;
use crate::prompts::{narrative_prompt, recommendations_prompt};
use crate::recommendations::parse_with_status;
use crate::reporting::ReportWriter;
use crate::types::{AnalysisResult, ProcessedOutput};
use crate::utils::{file_name, file_stem};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runs the analysis pipeline for one file at a time.
///
/// The two inference calls run sequentially. Any failure before the outputs
/// are written aborts the run without touching the output directory.
pub struct FileProcessor {
    client: Arc<dyn InferenceClient>,
    writer: ReportWriter,
}

impl FileProcessor {
    pub fn new(client: Arc<dyn InferenceClient>, writer: ReportWriter) -> Self {
        Self { client, writer }
    }

    pub fn client(&self) -> &dyn InferenceClient {
        self.client.as_ref()
    }

    pub fn writer(&self) -> &ReportWriter {
        &self.writer
    }

    /// Load, profile and query the model without writing anything.
    pub fn analyze(&self, path: &Path) -> Result<AnalysisResult> {
        let name = file_name(path);
        let df = load_table(path)?;
        let basic_stats = extract_basic_stats(&df)?;

        let narrative_prompt = narrative_prompt(&basic_stats)?;
        let recommendations_prompt = recommendations_prompt(&basic_stats)?;

        debug!(file = %name, backend = self.client.name(), "Requesting narrative analysis");
        let narrative = self.client.generate(&narrative_prompt)?;

        debug!(file = %name, "Requesting recommendations");
        let raw_recommendations = self.client.generate(&recommendations_prompt)?;
        let (recommendations, degraded) = parse_with_status(&raw_recommendations);

        Ok(AnalysisResult {
            file_name: name,
            basic_stats,
            narrative,
            recommendations,
            degraded,
        })
    }

    /// Analyze `path` and write both output artifacts.
    pub fn process(&self, path: &Path) -> Result<ProcessedOutput> {
        let start = Instant::now();
        info!("Processing {}", path.display());

        let result = self.analyze(path).context(file_name(path))?;
        let (report_path, recommendations_path) = self
            .writer
            .write_outputs(&file_stem(path), &result, Local::now())
            .context(file_name(path))?;

        info!(
            file = %result.file_name,
            degraded = result.degraded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(ProcessedOutput {
            result,
            report_path,
            recommendations_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, InferenceError};
    use crate::recommendations::sentinel;
    use std::sync::Mutex;

    /// Replays canned answers in order and records every prompt.
    struct ScriptedClient {
        answers: Mutex<Vec<std::result::Result<String, InferenceError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(answers: Vec<std::result::Result<String, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl InferenceClient for ScriptedClient {
        fn generate(&self, prompt: &str) -> std::result::Result<String, InferenceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(InferenceError::Transport("no answer left".to_string())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    const VALID_RECOMMENDATIONS: &str = r#"{"datenverarbeitung": ["Ausreißer prüfen"],
        "weitere_analysen": [], "visualisierungen": ["Boxplot"], "actionable_insights": []}"#;

    fn write_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("werte.csv");
        std::fs::write(&path, "numeric\n1\n2\n3\n100\n4\n5\n").unwrap();
        path
    }

    #[test]
    fn test_process_writes_both_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_csv(tmp.path());
        let client = ScriptedClient::new(vec![
            Ok("Eine kleine Tabelle.".to_string()),
            Ok(VALID_RECOMMENDATIONS.to_string()),
        ]);
        let processor = FileProcessor::new(client.clone(), ReportWriter::new(tmp.path().join("out")));

        let output = processor.process(&input).unwrap();
        assert_eq!(output.result.basic_stats.row_count, 6);
        assert_eq!(output.result.basic_stats.column_count, 1);
        assert!(!output.result.degraded);
        assert_eq!(output.result.recommendations.visualizations, vec!["Boxplot"]);
        assert!(output.report_path.ends_with("analyse_werte.txt"));
        assert!(output.recommendations_path.ends_with("empfehlungen_werte.json"));
        assert!(output.recommendations_path.exists());

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].starts_with("Als Data Science Experte"));
        assert!(prompts[1].starts_with("Basierend auf der vorherigen Analyse"));
    }

    #[test]
    fn test_unparseable_recommendations_degrade() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_csv(tmp.path());
        let client = ScriptedClient::new(vec![
            Ok("Narrativ".to_string()),
            Ok("Leider kein JSON".to_string()),
        ]);
        let processor = FileProcessor::new(client, ReportWriter::new(tmp.path().join("out")));

        let result = processor.analyze(&input).unwrap();
        assert!(result.degraded);
        assert_eq!(result.recommendations, sentinel());
    }

    #[test]
    fn test_second_call_failure_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_csv(tmp.path());
        let out = tmp.path().join("out");
        let client = ScriptedClient::new(vec![
            Ok("Narrativ".to_string()),
            Err(InferenceError::Status {
                status: 503,
                body: "busy".to_string(),
            }),
        ]);
        let processor = FileProcessor::new(client, ReportWriter::new(&out));

        let err = processor.process(&input).unwrap_err();
        assert_eq!(err.error_code(), "INFERENCE_ERROR");
        assert!(!out.join("analyse_werte.txt").exists());
        assert!(!out.join("empfehlungen_werte.json").exists());
    }

    #[test]
    fn test_unsupported_format_skips_model() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("notiz.md");
        std::fs::write(&input, "# Hallo").unwrap();
        let client = ScriptedClient::new(vec![]);
        let processor = FileProcessor::new(client.clone(), ReportWriter::new(tmp.path()));

        let err = processor.process(&input).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert!(client.prompts.lock().unwrap().is_empty());
        let record = err.to_record("notiz.md");
        assert_eq!(record.status, "error");
    }

    #[test]
    fn test_analyze_maps_missing_file_to_load_error() {
        let client = ScriptedClient::new(vec![]);
        let processor = FileProcessor::new(client, ReportWriter::new("unused"));
        let err = processor.analyze(Path::new("/nonexistent/x.csv")).unwrap_err();
        assert!(matches!(err, AnalysisError::Load(_)));
    }
}
