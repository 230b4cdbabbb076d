//! Response Parser for the recommendations call.
//!
//! Parsing never fails. Anything that is not exactly the four-field object
//! (optionally inside a Markdown code fence) is replaced by the sentinel set;
//! no field-by-field salvage is attempted.

use crate::types::RecommendationSet;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Single entry of the sentinel `datenverarbeitung` list.
pub const PARSE_FAILURE_MESSAGE: &str = "Fehler beim Parsen der Empfehlungen";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*?)\n?\s*```$").expect("Invalid regex: code fence")
});

/// The placeholder returned when the response cannot be parsed.
pub fn sentinel() -> RecommendationSet {
    RecommendationSet {
        data_processing: vec![PARSE_FAILURE_MESSAGE.to_string()],
        ..RecommendationSet::default()
    }
}

/// Parse the raw model output, substituting the sentinel on failure.
pub fn parse(raw: &str) -> RecommendationSet {
    parse_with_status(raw).0
}

/// Like [`parse`], also reporting whether the sentinel was substituted.
pub fn parse_with_status(raw: &str) -> (RecommendationSet, bool) {
    let body = strip_code_fence(raw.trim());
    match serde_json::from_str::<RecommendationSet>(body) {
        Ok(set) => (set, false),
        Err(e) => {
            warn!(raw_len = raw.len(), error = %e, "Recommendations unparseable, using placeholder");
            (sentinel(), true)
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}
