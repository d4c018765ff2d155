//! Upload validation: partition candidates into accepted and rejected.
//!
//! Rejection is a normal outcome, not an error. Each rejected file yields
//! exactly one [`Rejection`] naming the first check it failed, so
//! `accepted.len() + rejected.len()` always equals the input length.

use crate::config::ClientConfig;
use crate::pipeline::input::{extension_of, UploadCandidate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which uploads are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPolicy {
    /// Dot-prefixed, lower-case extensions, e.g. `.pdf`.
    pub accepted_extensions: Vec<String>,
    /// Maximum size in megabytes.
    pub max_size_mb: f64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_extensions: vec![".pdf".into(), ".png".into()],
            max_size_mb: 1.0,
        }
    }
}

impl From<&ClientConfig> for UploadPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            accepted_extensions: config.accepted_extensions.clone(),
            max_size_mb: config.max_file_size_mb,
        }
    }
}

impl UploadPolicy {
    fn accepts_extension(&self, name: &str) -> bool {
        let Some(ext) = extension_of(name) else {
            return false;
        };
        let ext = format!(".{ext}");
        self.accepted_extensions
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(&ext))
    }
}

/// Why a candidate was turned away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    UnsupportedExtension,
    TooLarge { actual_mb: f64, max_mb: f64 },
}

/// One rejected candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub file_name: String,
    #[serde(flatten)]
    pub reason: RejectionReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectionReason::UnsupportedExtension => {
                write!(f, "{}: Unsupported file type", self.file_name)
            }
            RejectionReason::TooLarge { actual_mb, max_mb } => write!(
                f,
                "{}: File too large ({:.2}MB > {}MB)",
                self.file_name, actual_mb, max_mb
            ),
        }
    }
}

/// Result of [`validate_files`].
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Candidates that passed both checks, in input order.
    pub accepted: Vec<UploadCandidate>,
    pub rejected: Vec<Rejection>,
}

impl ValidationReport {
    /// All rejection messages joined one per line.
    pub fn rejection_message(&self) -> Option<String> {
        if self.rejected.is_empty() {
            return None;
        }
        Some(
            self.rejected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Check every candidate's extension, then its size.
pub fn validate_files(
    candidates: impl IntoIterator<Item = UploadCandidate>,
    policy: &UploadPolicy,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for candidate in candidates {
        if !policy.accepts_extension(candidate.name()) {
            report.rejected.push(Rejection {
                file_name: candidate.name().to_string(),
                reason: RejectionReason::UnsupportedExtension,
            });
            continue;
        }

        let size_mb = candidate.size_mb();
        if size_mb > policy.max_size_mb {
            report.rejected.push(Rejection {
                file_name: candidate.name().to_string(),
                reason: RejectionReason::TooLarge {
                    actual_mb: size_mb,
                    max_mb: policy.max_size_mb,
                },
            });
            continue;
        }

        report.accepted.push(candidate);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    fn file(name: &str, size: usize) -> UploadCandidate {
        UploadCandidate::from_bytes(name, vec![0u8; size])
    }

    #[test]
    fn oversized_pdf_is_rejected_with_both_sizes() {
        let report = validate_files(vec![file("big.pdf", 2 * MB)], &UploadPolicy::default());
        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(
            report.rejected[0].to_string(),
            "big.pdf: File too large (2.00MB > 1MB)"
        );
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let report = validate_files(
            vec![file("A.PDF", 10), file("b.Png", 10)],
            &UploadPolicy::default(),
        );
        assert_eq!(report.accepted.len(), 2);
        assert!(report.rejected.is_empty());
        assert!(report.rejection_message().is_none());
    }

    #[test]
    fn unsupported_extension_wins_over_size() {
        let report = validate_files(vec![file("notes.txt", 5 * MB)], &UploadPolicy::default());
        assert_eq!(report.rejected[0].reason, RejectionReason::UnsupportedExtension);
        assert_eq!(report.rejected[0].to_string(), "notes.txt: Unsupported file type");
    }

    #[test]
    fn file_without_extension_is_rejected() {
        let report = validate_files(vec![file("LABEL", 1)], &UploadPolicy::default());
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn exactly_max_size_is_accepted() {
        let report = validate_files(vec![file("edge.png", MB)], &UploadPolicy::default());
        assert_eq!(report.accepted.len(), 1);
    }

    #[test]
    fn partition_is_complete_and_ordered() {
        let input = vec![
            file("1.pdf", 10),
            file("2.gif", 10),
            file("3.png", 10),
            file("4.pdf", 3 * MB),
            file("5.PDF", 10),
        ];
        let n = input.len();
        let policy = UploadPolicy::default();
        let report = validate_files(input, &policy);

        assert_eq!(report.accepted.len() + report.rejected.len(), n);
        let names: Vec<&str> = report.accepted.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["1.pdf", "3.png", "5.PDF"]);
        for c in &report.accepted {
            assert!(c.size_mb() <= policy.max_size_mb);
        }
        let msg = report.rejection_message().unwrap();
        assert_eq!(msg.lines().count(), 2);
    }

    #[test]
    fn custom_policy() {
        let policy = UploadPolicy {
            accepted_extensions: vec![".zpl".into()],
            max_size_mb: 0.5,
        };
        let report = validate_files(vec![file("a.zpl", 100), file("a.pdf", 100)], &policy);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].name(), "a.zpl");
    }
}
