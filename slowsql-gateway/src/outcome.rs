//! Classification of the analyzer's JSON output.

use serde_json::Value;

/// How a parsed analyzer result should be reported back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    /// Top-level object carrying an `"error"` key.
    ObjectError(String),
    /// First object inside a top-level array carrying an `"error"` key.
    ItemError { index: usize, message: String },
    /// Top-level object carrying a `"warnn"` key: ran fine, no slow log.
    Warning(String),
    /// Anything else, relayed verbatim.
    Findings(Value),
}

impl AnalysisResult {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(ref map) => {
                if let Some(err) = map.get("error") {
                    return AnalysisResult::ObjectError(
                        text_or(err, "Unknown error occurred"),
                    );
                }
                if let Some(warn) = map.get("warnn") {
                    return AnalysisResult::Warning(text_or(warn, "no slow log!"));
                }
                AnalysisResult::Findings(value)
            }
            Value::Array(ref items) => {
                let failed = items.iter().enumerate().find_map(|(index, item)| {
                    item.get("error").map(|err| AnalysisResult::ItemError {
                        index,
                        message: text_or(err, "Unknown error"),
                    })
                });
                failed.unwrap_or(AnalysisResult::Findings(value))
            }
            other => AnalysisResult::Findings(other),
        }
    }
}

fn text_or(value: &Value, fallback: &str) -> String {
    value.as_str().unwrap_or(fallback).to_string()
}
