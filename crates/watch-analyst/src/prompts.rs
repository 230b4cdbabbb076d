//! Fixed German prompt templates.
//!
//! Two templates feed the table pipeline (narrative analysis and structured
//! recommendations); the rest back [`crate::analyzer::TextAnalyzer`].
//! Interpolation is the only variable part.

use crate::error::Result;
use crate::types::BasicStats;

/// Four-section narrative analysis of the statistics.
pub fn narrative_prompt(stats: &BasicStats) -> Result<String> {
    let stats_json = serde_json::to_string_pretty(stats)?;
    Ok(format!(
        "Als Data Science Experte, analysiere folgende Daten und antworte auf Deutsch:\n\n\
        Basis-Statistiken:\n{stats_json}\n\n\
        Bitte führe eine detaillierte Analyse durch und strukturiere deine Antwort in folgende Abschnitte:\n\n\
        1. Datenübersicht: Beschreibe die grundlegende Struktur und den Inhalt der Daten\n\
        2. Statistische Analyse: Erkläre wichtige statistische Merkmale und Auffälligkeiten\n\
        3. Datenqualität: Bewerte die Qualität und Vollständigkeit der Daten\n\
        4. Muster und Trends: Beschreibe erkennbare Muster oder Trends in den Daten\n\n\
        Gib eine ausführliche, gut strukturierte Analyse in natürlicher Sprache."
    ))
}

/// Recommendations as a JSON object with exactly four string-list fields.
///
/// The statistics are repeated here since each generate call is stateless.
pub fn recommendations_prompt(stats: &BasicStats) -> Result<String> {
    let stats_json = serde_json::to_string_pretty(stats)?;
    Ok(format!(
        "Basierend auf der vorherigen Analyse, erstelle konkrete Empfehlungen.\n\n\
        Basis-Statistiken:\n{stats_json}\n\n\
        Antworte ausschließlich mit gültigem JSON in folgendem Format:\n\
        {{\n    \
        \"datenverarbeitung\": [\"Empfehlung zur Datenverarbeitung\", \"...\"],\n    \
        \"weitere_analysen\": [\"Vorgeschlagene weiterführende Analyse\", \"...\"],\n    \
        \"visualisierungen\": [\"Empfohlene Visualisierung\", \"...\"],\n    \
        \"actionable_insights\": [\"Konkrete Handlungsempfehlung\", \"...\"]\n\
        }}"
    ))
}

/// Structured summary of a text document.
pub fn document_analysis_prompt(content: &str) -> String {
    format!(
        "Analysiere den folgenden Text und erstelle eine strukturierte Zusammenfassung.\n\
        Berücksichtige dabei:\n\
        1. Hauptthemen\n\
        2. Wichtigste Aussagen\n\
        3. Schlüsselwörter\n\
        4. Ton und Stil\n\n\
        Text:\n{content}\n\n\
        Strukturierte Analyse:\n"
    )
}

/// Code review of a whole file. `language` tags the fenced block and may be empty.
pub fn code_review_prompt(code: &str, language: &str) -> String {
    format!(
        "Führe ein Code-Review für den folgenden Code durch.\n\
        Achte besonders auf:\n\
        1. Code-Qualität\n\
        2. Best Practices\n\
        3. Mögliche Verbesserungen\n\
        4. Potenzielle Bugs oder Sicherheitsprobleme\n\n\
        Code:\n```{language}\n{code}\n```\n\n\
        Code-Review Ergebnis:\n"
    )
}

/// Improvement suggestions for a short snippet.
pub fn improvements_prompt(snippet: &str, language: &str) -> String {
    format!(
        "Analysiere den folgenden Code und schlage Verbesserungen vor:\n\n\
        ```{language}\n{snippet}\n```\n\n\
        Fokussiere dich auf:\n\
        1. Best Practices\n\
        2. Performance\n\
        3. Lesbarkeit\n\
        4. Potenzielle Bugs\n"
    )
}

pub fn summarization_prompt(text: &str) -> String {
    format!(
        "Fasse den folgenden Text kurz und prägnant zusammen.\n\
        Behalte die wichtigsten Informationen bei und\n\
        strukturiere die Zusammenfassung klar.\n\n\
        Text:\n{text}\n\n\
        Zusammenfassung:\n"
    )
}

pub fn comparison_prompt(first: &str, second: &str) -> String {
    format!(
        "Vergleiche die folgenden zwei Texte und\n\
        identifiziere Gemeinsamkeiten und Unterschiede.\n\n\
        Text 1:\n{first}\n\n\
        Text 2:\n{second}\n\n\
        Vergleichsanalyse:\n"
    )
}
