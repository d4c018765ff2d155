//! Error types for the labelzpl library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LabelZplError`] — **Fatal**: the operation cannot proceed at all
//!   (no credential configured, file missing, archive could not be built).
//!   Returned as `Err(LabelZplError)` from the top-level entry points.
//!
//! * [`ConversionError`] — **Non-fatal**: a single file failed (the API
//!   rejected it, the network dropped, the type is unsupported) but every
//!   other file in the batch is unaffected. Stored inside
//!   [`crate::output::ConversionOutcome`] so a batch always reports one
//!   outcome per input.
//!
//! `ConversionError` is a tagged enum rather than a bag of optional fields:
//! callers match on the variant to tell a server-side rejection from a
//! connectivity problem from a local bug, because each one calls for a
//! different corrective action.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the labelzpl library.
///
/// Per-file failures inside a batch use [`ConversionError`] and are stored
/// in [`crate::output::ConversionOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum LabelZplError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Label file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A conversion was requested with nothing selected.
    #[error("No files selected. Select at least one PDF or PNG file.")]
    NoFilesSelected,

    /// Single-file mode was asked to convert more than one file.
    #[error("{count} files selected. Use batch mode to convert several files.")]
    MultipleFilesSelected { count: usize },

    /// Single-file mode received a file whose type has no conversion endpoint.
    #[error("Unsupported file type for '{file_name}'. Use PDF or PNG.")]
    UnsupportedFileType { file_name: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The single requested conversion failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    // ── Packaging errors ──────────────────────────────────────────────────
    /// The ZIP archive could not be assembled.
    #[error("Failed to build archive: {detail}")]
    ArchiveFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an exported file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// No API credential was supplied.
    #[error(
        "No API key configured for the conversion service.\n\
Set LABELZPL_API_KEY or pass --api-key <KEY>."
    )]
    MissingCredential,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A conversion parameter is outside its domain.
    #[error("Invalid conversion parameter: {0}")]
    InvalidParameters(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file.
///
/// The `Display` output is the message shown to the user; the `detail`
/// fields keep the underlying cause for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionError {
    /// The service answered with a non-2xx status.
    #[error("Error {status}: {}", display_body(.body))]
    Remote { status: u16, body: String },

    /// No response arrived: timeout, refused connection, dropped stream.
    #[error("Connection error. Check your internet connection and try again.")]
    Connectivity { detail: String },

    /// The request could not be built or the response could not be handled.
    #[error("Internal error. Please try again.")]
    Internal { detail: String },

    /// No conversion endpoint exists for this file's extension.
    #[error("Unsupported file type")]
    UnsupportedFileType { file_name: String },

    /// A local failure outside the request client (payload read, panic).
    #[error("Unexpected error during conversion")]
    Unexpected { detail: String },

    /// The batch was cancelled before this file was started.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConversionError {
    /// Whether the server actually received and rejected the request.
    pub fn is_remote(&self) -> bool {
        matches!(self, ConversionError::Remote { .. })
    }

    /// Underlying cause for logging; falls back to the user message.
    pub fn detail(&self) -> String {
        match self {
            ConversionError::Remote { body, .. } => body.clone(),
            ConversionError::Connectivity { detail }
            | ConversionError::Internal { detail }
            | ConversionError::Unexpected { detail } => detail.clone(),
            ConversionError::UnsupportedFileType { file_name } => file_name.clone(),
            ConversionError::Cancelled => self.to_string(),
        }
    }
}

fn display_body(body: &str) -> &str {
    if body.trim().is_empty() {
        "Unknown error"
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_display_embeds_status_and_body() {
        let e = ConversionError::Remote {
            status: 500,
            body: "bad params".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("bad params"), "got: {msg}");
    }

    #[test]
    fn remote_display_without_body() {
        let e = ConversionError::Remote {
            status: 502,
            body: String::new(),
        };
        assert_eq!(e.to_string(), "Error 502: Unknown error");
    }

    #[test]
    fn failure_classes_have_distinct_messages() {
        let connectivity = ConversionError::Connectivity {
            detail: "operation timed out".into(),
        }
        .to_string();
        let internal = ConversionError::Internal {
            detail: "builder error".into(),
        }
        .to_string();
        let remote = ConversionError::Remote {
            status: 400,
            body: "x".into(),
        }
        .to_string();

        assert_ne!(connectivity, internal);
        assert_ne!(connectivity, remote);
        assert_ne!(internal, remote);
        // Details never leak into the user-facing text.
        assert!(!connectivity.contains("timed out"));
    }

    #[test]
    fn conversion_error_serialises_with_kind_tag() {
        let e = ConversionError::Connectivity {
            detail: "refused".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "connectivity");
        assert_eq!(json["detail"], "refused");
    }

    #[test]
    fn single_mode_wraps_conversion_error() {
        let e: LabelZplError = ConversionError::Remote {
            status: 401,
            body: "invalid token".into(),
        }
        .into();
        assert_eq!(e.to_string(), "Error 401: invalid token");
    }

    #[test]
    fn missing_credential_mentions_env_var() {
        assert!(LabelZplError::MissingCredential
            .to_string()
            .contains("LABELZPL_API_KEY"));
    }
}
