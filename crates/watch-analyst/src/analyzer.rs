//! Free-text analysis with the same model backend.
//!
//! [`TextAnalyzer`] renders one fixed template per operation and makes a
//! single inference call. Nothing is written to disk.

use crate::ai::InferenceClient;
use crate::error::{AnalysisError, Result};
use crate::prompts::{
    code_review_prompt, comparison_prompt, document_analysis_prompt, improvements_prompt,
    summarization_prompt,
};
use crate::types::{CodeReview, DocumentAnalysis};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Language assumed for snippets passed to [`TextAnalyzer::suggest_improvements`].
pub const DEFAULT_SNIPPET_LANGUAGE: &str = "python";

pub struct TextAnalyzer {
    client: Arc<dyn InferenceClient>,
}

impl TextAnalyzer {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Model name reported in results, falling back to the backend name.
    pub fn model_used(&self) -> String {
        self.client
            .model()
            .unwrap_or_else(|| self.client.name())
            .to_string()
    }

    /// Structured summary (topics, key statements, keywords, tone) of a text file.
    pub fn analyze_document(&self, path: &Path) -> Result<DocumentAnalysis> {
        let content = read_text(path)?;
        let summary = self.ask(&document_analysis_prompt(&content))?;
        Ok(DocumentAnalysis {
            summary,
            file_path: path.display().to_string(),
            model_used: self.model_used(),
        })
    }

    /// Code review of a source file.
    pub fn review_code(&self, path: &Path) -> Result<CodeReview> {
        let code = read_text(path)?;
        let language = fence_language(path);
        let suggestions = self.ask(&code_review_prompt(&code, language))?;
        Ok(CodeReview {
            suggestions,
            file_analyzed: path.display().to_string(),
            model_used: self.model_used(),
        })
    }

    pub fn suggest_improvements(&self, snippet: &str) -> Result<String> {
        self.ask(&improvements_prompt(snippet, DEFAULT_SNIPPET_LANGUAGE))
    }

    pub fn summarize(&self, text: &str) -> Result<String> {
        self.ask(&summarization_prompt(text))
    }

    pub fn compare(&self, first: &str, second: &str) -> Result<String> {
        self.ask(&comparison_prompt(first, second))
    }

    fn ask(&self, prompt: &str) -> Result<String> {
        debug!(backend = self.client.name(), prompt_len = prompt.len(), "Text analysis request");
        Ok(self.client.generate(prompt)?)
    }
}

/// Read a file as UTF-8, reporting unreadable or non-UTF-8 content as a load error.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AnalysisError::Load(format!("{}: {}", path.display(), e)))
}

/// Markdown fence tag for a source file, by extension.
fn fence_language(path: &Path) -> &str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "py" => "python",
        "rs" => "rust",
        "js" | "mjs" => "javascript",
        "ts" => "typescript",
        "sh" => "bash",
        "yml" => "yaml",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use std::sync::Mutex;

    struct EchoClient {
        last_prompt: Mutex<Option<String>>,
    }

    impl EchoClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                last_prompt: Mutex::new(None),
            })
        }
    }

    impl InferenceClient for EchoClient {
        fn generate(&self, prompt: &str) -> std::result::Result<String, InferenceError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(format!("Antwort ({} Zeichen)", prompt.chars().count()))
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> Option<&str> {
            Some("mistral")
        }
    }

    #[test]
    fn test_analyze_document() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("brief.txt");
        std::fs::write(&path, "Sehr geehrte Damen und Herren").unwrap();

        let client = EchoClient::new();
        let analyzer = TextAnalyzer::new(client.clone());
        let result = analyzer.analyze_document(&path).unwrap();

        assert!(result.summary.starts_with("Antwort"));
        assert_eq!(result.model_used, "mistral");
        assert_eq!(result.file_path, path.display().to_string());
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Sehr geehrte Damen und Herren"));
        assert!(prompt.contains("1. Hauptthemen"));
    }

    #[test]
    fn test_review_code_tags_language() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("main.rs");
        std::fs::write(&path, "fn main() {}").unwrap();

        let client = EchoClient::new();
        let analyzer = TextAnalyzer::new(client.clone());
        let review = analyzer.review_code(&path).unwrap();

        assert_eq!(review.file_analyzed, path.display().to_string());
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("```rust\nfn main() {}\n```"));
    }

    #[test]
    fn test_non_utf8_file_is_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("binary.txt");
        std::fs::write(&path, [0xffu8, 0xfe, 0x00, 0x80]).unwrap();

        let analyzer = TextAnalyzer::new(EchoClient::new());
        let err = analyzer.analyze_document(&path).unwrap_err();
        assert_eq!(err.error_code(), "LOAD_ERROR");
    }

    #[test]
    fn test_compare_and_summarize_use_templates() {
        let client = EchoClient::new();
        let analyzer = TextAnalyzer::new(client.clone());

        analyzer.compare("alt", "neu").unwrap();
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Text 1:\nalt") && prompt.contains("Text 2:\nneu"));

        analyzer.summarize("Langer Text").unwrap();
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Zusammenfassung:"));

        analyzer.suggest_improvements("x=1").unwrap();
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("```python\nx=1\n```"));
    }

    #[test]
    fn test_model_used_falls_back_to_name() {
        struct Nameless;
        impl InferenceClient for Nameless {
            fn generate(&self, _: &str) -> std::result::Result<String, InferenceError> {
                Ok(String::new())
            }
            fn name(&self) -> &str {
                "local"
            }
        }
        assert_eq!(TextAnalyzer::new(Arc::new(Nameless)).model_used(), "local");
    }
}
