//! Integration tests for the watch-and-analyze pipeline.
//!
//! The model backend is replaced by a minimal HTTP/1.1 server on a local
//! port that answers a fixed sequence of responses.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use watch_analyst::ai::{OllamaClient, OllamaConfig};
use watch_analyst::recommendations::sentinel;
use watch_analyst::{
    AnalysisError, CancellationToken, CorrelationMethod, DirectoryWatcher, EventOutcome,
    FileHandler, FileProcessor, OutlierMethod, RecommendationsDocument, ReportWriter, Result,
    WatchEvent, detect_outliers, extract_basic_stats, load_table, significant_correlations,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Copy a fixture into `dir` and return the new path.
fn stage_fixture(name: &str, dir: &Path) -> PathBuf {
    let target = dir.join(name);
    std::fs::copy(fixtures_path().join(name), &target).unwrap();
    target
}

/// Serves one canned response per connection, then stops accepting.
struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap() == 0 {
                        break;
                    }
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':')
                        && name.eq_ignore_ascii_case("content-length")
                    {
                        content_length = value.trim().parse().unwrap();
                    }
                }

                let mut request_body = vec![0u8; content_length];
                reader.read_exact(&mut request_body).unwrap();
                recorded
                    .lock()
                    .unwrap()
                    .push(serde_json::from_slice(&request_body).unwrap_or(Value::Null));

                let reason = if status < 300 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
        });

        Self {
            base_url,
            requests,
            handle: Some(handle),
        }
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        // Only join when every response was consumed; otherwise the thread is parked in accept().
        if let Some(handle) = self.handle.take()
            && handle.is_finished()
        {
            let _ = handle.join();
        }
    }
}

fn completion(text: &str) -> (u16, String) {
    (
        200,
        json!({"model": "mistral", "response": text, "done": true}).to_string(),
    )
}

fn processor_for(base_url: &str, output_dir: &Path) -> FileProcessor {
    let client = OllamaClient::with_config(
        OllamaConfig::builder()
            .model("mistral")
            .base_url(base_url)
            .timeout_secs(10)
            .build(),
    )
    .unwrap();
    FileProcessor::new(Arc::new(client), ReportWriter::new(output_dir))
}

const RECOMMENDATIONS: &str = r#"{
    "datenverarbeitung": ["Ausreißer in 'numeric' prüfen"],
    "weitere_analysen": ["Verteilungsanalyse"],
    "visualisierungen": ["Boxplot"],
    "actionable_insights": ["Datenerfassung für Wert 100 verifizieren"]
}"#;

// ============================================================================
// End-to-End Processing
// ============================================================================

#[test]
fn test_process_outlier_table_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let input = stage_fixture("outlier.csv", tmp.path());
    let out = tmp.path().join("output");

    let server = StubServer::start(vec![
        completion("1. Datenübersicht: sechs Werte, einer davon auffällig."),
        completion(RECOMMENDATIONS),
    ]);
    let processor = processor_for(&server.base_url, &out);

    let output = processor.process(&input).unwrap();

    let stats = &output.result.basic_stats;
    assert_eq!(stats.row_count, 6);
    assert_eq!(stats.column_count, 1);
    assert_eq!(stats.columns, vec!["numeric"]);
    assert!(!output.result.degraded);

    let report = std::fs::read_to_string(out.join("analyse_outlier.txt")).unwrap();
    assert!(report.starts_with("Analyse für: outlier.csv"));
    assert!(report.contains("DATENANALYSE"));
    assert!(report.ends_with("1. Datenübersicht: sechs Werte, einer davon auffällig."));

    let raw_json = std::fs::read_to_string(out.join("empfehlungen_outlier.json")).unwrap();
    assert!(raw_json.contains("Ausreißer"));
    let document: RecommendationsDocument = serde_json::from_str(&raw_json).unwrap();
    assert_eq!(document.status, "success");
    assert_eq!(document.basic_stats.row_count, stats.row_count);
    assert_eq!(document.basic_stats.columns, stats.columns);
    assert_eq!(document.empfehlungen.visualizations, vec!["Boxplot"]);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request["model"], "mistral");
        assert_eq!(request["stream"], false);
    }
    assert!(
        requests[0]["prompt"]
            .as_str()
            .unwrap()
            .contains("\"row_count\": 6")
    );
}

#[test]
fn test_fenced_recommendations_are_accepted() {
    let tmp = tempfile::tempdir().unwrap();
    let input = stage_fixture("sales.csv", tmp.path());

    let fenced = format!("```json\n{RECOMMENDATIONS}\n```");
    let server = StubServer::start(vec![completion("Narrativ"), completion(&fenced)]);
    let processor = processor_for(&server.base_url, tmp.path());

    let result = processor.analyze(&input).unwrap();
    assert!(!result.degraded);
    assert_eq!(result.recommendations.further_analyses, vec!["Verteilungsanalyse"]);
}

#[test]
fn test_malformed_recommendations_write_sentinel() {
    let tmp = tempfile::tempdir().unwrap();
    let input = stage_fixture("outlier.csv", tmp.path());

    let server = StubServer::start(vec![
        completion("Narrativ"),
        completion("{'datenverarbeitung': ['einfache Anführungszeichen']}"),
    ]);
    let processor = processor_for(&server.base_url, tmp.path());

    let output = processor.process(&input).unwrap();
    assert!(output.result.degraded);

    let document: RecommendationsDocument =
        serde_json::from_str(&std::fs::read_to_string(&output.recommendations_path).unwrap())
            .unwrap();
    assert_eq!(document.empfehlungen, sentinel());
}

// ============================================================================
// Inference Failures
// ============================================================================

fn assert_no_outputs(dir: &Path, stem: &str) {
    assert!(!dir.join(format!("analyse_{stem}.txt")).exists());
    assert!(!dir.join(format!("empfehlungen_{stem}.json")).exists());
}

#[test]
fn test_non_2xx_reports_inference_error_and_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let input = stage_fixture("outlier.csv", tmp.path());
    let out = tmp.path().join("output");

    let server = StubServer::start(vec![(
        500,
        json!({"error": "model 'mistral' not found"}).to_string(),
    )]);
    let processor = processor_for(&server.base_url, &out);

    let err = processor.process(&input).unwrap_err();
    assert_eq!(err.error_code(), "INFERENCE_ERROR");
    assert!(err.to_string().contains("500"));
    assert_no_outputs(&out, "outlier");
}

#[test]
fn test_connection_refused_reports_inference_error() {
    let tmp = tempfile::tempdir().unwrap();
    let input = stage_fixture("outlier.csv", tmp.path());
    let out = tmp.path().join("output");

    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let processor = processor_for(&format!("http://127.0.0.1:{port}"), &out);

    let err = processor.process(&input).unwrap_err();
    assert_eq!(err.error_code(), "INFERENCE_ERROR");
    assert!(err.is_recoverable());
    assert_no_outputs(&out, "outlier");
}

#[test]
fn test_missing_completion_field_is_inference_error() {
    let tmp = tempfile::tempdir().unwrap();
    let input = stage_fixture("outlier.csv", tmp.path());

    let server = StubServer::start(vec![(200, json!({"done": true}).to_string())]);
    let processor = processor_for(&server.base_url, tmp.path());

    let err = processor.process(&input).unwrap_err();
    assert_eq!(err.error_code(), "INFERENCE_ERROR");
    assert_no_outputs(tmp.path(), "outlier");
}

#[test]
fn test_unsupported_format_never_calls_model() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("notizen.txt");
    std::fs::write(&input, "kein Tabellenformat").unwrap();

    let server = StubServer::start(vec![completion("sollte nie kommen")]);
    let processor = processor_for(&server.base_url, tmp.path());

    let err = processor.process(&input).unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    assert_eq!(err.to_record("notizen.txt").code, "UNSUPPORTED_FORMAT");
    assert!(server.requests().is_empty());
}

// ============================================================================
// Statistics, Outliers and Correlations on Fixtures
// ============================================================================

#[test]
fn test_fixture_statistics() {
    let df = load_table(&fixtures_path().join("sales.csv")).unwrap();
    let stats = extract_basic_stats(&df).unwrap();

    assert_eq!(stats.row_count, df.height());
    assert_eq!(stats.column_count, df.width());
    assert_eq!(
        stats.columns,
        vec!["region", "product", "units", "price", "revenue"]
    );
    assert_eq!(stats.missing_values["units"], 1);
    assert_eq!(stats.missing_values["region"], 0);
    assert_eq!(stats.numeric_summary["units"].count, 7);
    assert!(!stats.numeric_summary.contains_key("region"));
}

#[test]
fn test_text_only_fixture_has_no_numeric_summary() {
    let df = load_table(&fixtures_path().join("text_only.csv")).unwrap();
    let stats = extract_basic_stats(&df).unwrap();
    assert_eq!(stats.row_count, 2);
    assert!(stats.numeric_summary.is_empty());
}

#[test]
fn test_fixture_iqr_outlier() {
    let df = load_table(&fixtures_path().join("outlier.csv")).unwrap();
    let outliers = detect_outliers(&df, None, OutlierMethod::Iqr).unwrap();
    assert_eq!(outliers["numeric"], vec![3]);
}

#[test]
fn test_fixture_units_revenue_correlated() {
    let df = load_table(&fixtures_path().join("sales.csv")).unwrap();
    for method in [CorrelationMethod::Pearson, CorrelationMethod::Spearman] {
        let matrix = significant_correlations(&df, method, 0.5).unwrap();
        let r = matrix.get("units", "revenue").unwrap();
        assert!(r > 0.5, "{method:?}: {r}");
    }
}

// ============================================================================
// Directory Watcher
// ============================================================================

/// Counts calls; shared so the test can observe it from outside the watcher.
#[derive(Clone, Default)]
struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

impl FileHandler for CountingHandler {
    fn handle_file(&self, _path: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_two_creation_events_invoke_processor_once() {
    let handler = CountingHandler::default();
    let mut watcher = DirectoryWatcher::new("data", handler.clone());
    let event = WatchEvent::file("data/messwerte.csv");

    watcher.handle_event(&event);
    watcher.handle_event(&event);

    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    assert_eq!(watcher.processed().len(), 1);
}

#[test]
fn test_watcher_boundary_survives_processor_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let server = StubServer::start(vec![]);
    let processor = processor_for(&server.base_url, tmp.path());
    let mut watcher = DirectoryWatcher::new(tmp.path(), processor);

    let outcome = watcher.handle_event(&WatchEvent::file(tmp.path().join("bild.png")));
    assert!(matches!(
        outcome,
        EventOutcome::Failed(ref e) if e.error_code() == "UNSUPPORTED_FORMAT"
    ));

    let outcome = watcher.handle_event(&WatchEvent::directory(tmp.path().join("unterordner")));
    assert!(matches!(outcome, EventOutcome::IgnoredDirectory));
    assert!(watcher.processed().is_empty());
}

#[test]
fn test_watcher_picks_up_created_file() {
    let tmp = tempfile::tempdir().unwrap();
    let watch_dir = tmp.path().to_path_buf();
    let handler = CountingHandler::default();
    let calls = Arc::clone(&handler.calls);
    let token = CancellationToken::new();

    let worker = {
        let token = token.clone();
        let watch_dir = watch_dir.clone();
        thread::spawn(move || -> std::result::Result<usize, AnalysisError> {
            let mut watcher = DirectoryWatcher::new(watch_dir, handler);
            watcher.run(&token)?;
            Ok(watcher.processed().len())
        })
    };

    // Give the OS watcher time to attach.
    thread::sleep(Duration::from_millis(500));
    std::fs::write(watch_dir.join("neu.csv"), "a\n1\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while calls.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    token.cancel();

    let processed = worker.join().unwrap().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(processed, 1);
}
