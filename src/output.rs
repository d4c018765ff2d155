//! Result types produced by single and batch conversions.

use crate::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The result of one file's conversion attempt.
///
/// Created once by the request client or the batch orchestrator and never
/// mutated afterwards; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    file_name: String,
    /// ZPL text returned by the service. Empty on failure.
    content: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    error: Option<ConversionError>,
}

impl ConversionOutcome {
    pub fn succeeded(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(file_name: impl Into<String>, error: ConversionError) -> Self {
        Self {
            file_name: file_name.into(),
            content: String::new(),
            success: false,
            error: Some(error),
        }
    }

    /// Build from a client result, keeping the error verbatim.
    pub fn from_result(file_name: impl Into<String>, result: Result<String, ConversionError>) -> Self {
        match result {
            Ok(content) => Self::succeeded(file_name, content),
            Err(e) => Self::failed(file_name, e),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&ConversionError> {
        self.error.as_ref()
    }

    /// User-facing failure message, if the attempt failed.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Success/failure counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[ConversionOutcome]) -> Self {
        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            successful,
            failed: outcomes.len() - successful,
        }
    }

    pub fn total(&self) -> usize {
        self.successful + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} successful / {} failed", self.successful, self.failed)
    }
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// One outcome per input file, in input order.
    pub outcomes: Vec<ConversionOutcome>,
    pub summary: BatchSummary,
    /// Names of the entries written to the archive, if one was built.
    #[serde(default)]
    pub archive_entries: Vec<String>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_outcome_has_empty_content() {
        let o = ConversionOutcome::failed("b.pdf", ConversionError::Cancelled);
        assert!(!o.is_success());
        assert_eq!(o.content(), "");
        assert_eq!(o.error_message().as_deref(), Some("Conversion cancelled"));
    }

    #[test]
    fn from_result_keeps_error_verbatim() {
        let err = ConversionError::Remote {
            status: 500,
            body: "bad params".into(),
        };
        let o = ConversionOutcome::from_result("a.pdf", Err(err.clone()));
        assert_eq!(o.error(), Some(&err));
    }

    #[test]
    fn summary_counts_and_display() {
        let outcomes = vec![
            ConversionOutcome::succeeded("a.pdf", "^XA^XZ"),
            ConversionOutcome::failed(
                "b.pdf",
                ConversionError::Connectivity {
                    detail: "timeout".into(),
                },
            ),
            ConversionOutcome::succeeded("c.png", "^XA^XZ"),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.to_string(), "2 successful / 1 failed");
    }

    #[test]
    fn outcome_serialises_camel_case() {
        let o = ConversionOutcome::succeeded("a.pdf", "X");
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["fileName"], "a.pdf");
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }
}
