//! Top-level conversion entry points and explicit export operations.
//!
//! ## Single vs. batch
//!
//! [`convert_single`] handles the one-file case: any failure is returned as
//! `Err` straight away, since there is nothing else to continue with.
//! [`convert_and_package`] runs the sequential batch orchestrator and then
//! packages the successes into a ZIP archive. Per-file failures stay inside
//! the report; a packaging failure is returned next to the report so the
//! outcomes remain available.
//!
//! ## Exporting
//!
//! Nothing in this crate writes files as a side effect of converting.
//! Callers decide when to persist a result with [`export_text`] or
//! [`export_archive`].

use crate::error::{ConversionError, LabelZplError};
use crate::output::{BatchReport, BatchSummary, ConversionOutcome};
use crate::params::ConversionParameters;
use crate::pipeline::archive::{archive_entry_name, package_outcomes, ArchiveArtifact};
use crate::pipeline::batch::convert_batch;
use crate::pipeline::input::UploadCandidate;
use crate::pipeline::request::{LabelConverter, SourceKind};
use crate::progress::BatchProgressCallback;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A finished batch: the per-file report plus the archive, if it could be built.
#[derive(Debug)]
pub struct BatchRun {
    pub report: BatchReport,
    pub archive: Result<ArchiveArtifact, LabelZplError>,
}

/// Convert one file and return its outcome.
///
/// # Errors
/// * [`LabelZplError::UnsupportedFileType`] — extension is neither PDF nor PNG
/// * [`LabelZplError::Conversion`] — the service call failed; the wrapped
///   [`ConversionError`] carries the failure class
pub async fn convert_single(
    converter: &dyn LabelConverter,
    candidate: &UploadCandidate,
    params: Option<&ConversionParameters>,
) -> Result<ConversionOutcome, LabelZplError> {
    let kind = SourceKind::from_file_name(candidate.name()).ok_or_else(|| {
        LabelZplError::UnsupportedFileType {
            file_name: candidate.name().to_string(),
        }
    })?;

    info!("Converting '{}' ({:?})", candidate.name(), kind);
    let outcome = converter.convert_file(candidate, kind, params).await;
    match outcome.error() {
        None => Ok(outcome),
        Some(e) => {
            warn!("'{}' failed: {}", candidate.name(), e.detail());
            Err(e.clone().into())
        }
    }
}

/// Convert every file in order, then package the successes.
pub async fn convert_and_package(
    converter: &dyn LabelConverter,
    files: &[UploadCandidate],
    params: &ConversionParameters,
    progress: &dyn BatchProgressCallback,
    cancel: &CancellationToken,
) -> BatchRun {
    let start = Instant::now();
    let outcomes = convert_batch(converter, files, params, progress, cancel).await;
    let summary = BatchSummary::from_outcomes(&outcomes);

    let archive = package_outcomes(&outcomes);
    if let Err(ref e) = archive {
        warn!("Packaging failed: {}", e);
    }

    let report = BatchReport {
        archive_entries: archive
            .as_ref()
            .map(|a| a.entries.clone())
            .unwrap_or_default(),
        outcomes,
        summary,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!("Batch finished: {}", report.summary);

    BatchRun { report, archive }
}

/// Ask the service to render ZPL text as a PDF.
///
/// Returns the confirmation message on success.
pub async fn render_to_pdf(
    converter: &dyn LabelConverter,
    zpl: &str,
    params: Option<&ConversionParameters>,
) -> Result<String, LabelZplError> {
    converter
        .render_zpl_to_pdf(zpl, params)
        .await
        .map_err(|e: ConversionError| {
            warn!("ZPL render failed: {}", e.detail());
            e.into()
        })
}

/// Write a successful outcome's ZPL as `<stem>.txt` inside `dir`.
///
/// Uses an atomic write (temp file + rename) to prevent partial files.
pub fn export_text(outcome: &ConversionOutcome, dir: impl AsRef<Path>) -> Result<PathBuf, LabelZplError> {
    if let Some(e) = outcome.error() {
        return Err(e.clone().into());
    }
    let path = dir.as_ref().join(archive_entry_name(outcome.file_name()));
    write_atomic(&path, outcome.content().as_bytes())?;
    Ok(path)
}

/// Write ZPL text to an explicit path.
pub fn export_zpl_to(content: &str, path: impl AsRef<Path>) -> Result<(), LabelZplError> {
    write_atomic(path.as_ref(), content.as_bytes())
}

/// Write a batch archive to `path`.
pub fn export_archive(artifact: &ArchiveArtifact, path: impl AsRef<Path>) -> Result<(), LabelZplError> {
    write_atomic(path.as_ref(), &artifact.bytes)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), LabelZplError> {
    let write_err = |source: std::io::Error| LabelZplError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
