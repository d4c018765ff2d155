//! Sequential batch conversion.
//!
//! Files are converted strictly one at a time, in input order. Progress
//! therefore increases monotonically and the service never sees more than
//! one request from a batch at once.
//!
//! A file's failure is recorded in its own [`ConversionOutcome`] and never
//! stops the loop: for N inputs the orchestrator always returns N outcomes.

use crate::error::ConversionError;
use crate::output::ConversionOutcome;
use crate::params::ConversionParameters;
use crate::pipeline::input::UploadCandidate;
use crate::pipeline::request::{LabelConverter, SourceKind};
use crate::progress::BatchProgressCallback;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Convert `files` one after another with the same `params`.
///
/// # Progress
/// `progress.on_progress(i, n, name)` fires before file `i` starts and
/// `progress.on_progress(n, n, "")` fires once after the loop.
///
/// # Cancellation
/// `cancel` is checked before each file. Once it is cancelled, every file
/// not yet started is recorded as [`ConversionError::Cancelled`] without a
/// start event; the final completion event still fires.
///
/// # Failures
/// * unsupported extension → [`ConversionError::UnsupportedFileType`],
///   the service is not called
/// * errors reported by the converter are kept verbatim
/// * a panic inside the converter → [`ConversionError::Unexpected`]
pub async fn convert_batch(
    converter: &dyn LabelConverter,
    files: &[UploadCandidate],
    params: &ConversionParameters,
    progress: &dyn BatchProgressCallback,
    cancel: &CancellationToken,
) -> Vec<ConversionOutcome> {
    let total = files.len();
    let mut outcomes = Vec::with_capacity(total);
    info!("Starting batch conversion of {} files", total);

    for (i, file) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!("Batch cancelled before '{}' ({}/{})", file.name(), i, total);
            outcomes.extend(
                files[i..]
                    .iter()
                    .map(|f| ConversionOutcome::failed(f.name(), ConversionError::Cancelled)),
            );
            break;
        }

        progress.on_progress(i, total, file.name());

        let outcome = convert_one(converter, file, params).await;
        if let Some(e) = outcome.error() {
            warn!("'{}' failed: {} ({})", file.name(), e, e.detail());
        }
        progress.on_file_complete(i, total, &outcome);
        outcomes.push(outcome);
    }

    progress.on_progress(total, total, "");

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    info!("Batch complete: {}/{} files converted", succeeded, total);
    outcomes
}

/// Convert a single batch entry, absorbing any local failure.
async fn convert_one(
    converter: &dyn LabelConverter,
    file: &UploadCandidate,
    params: &ConversionParameters,
) -> ConversionOutcome {
    let Some(kind) = SourceKind::from_file_name(file.name()) else {
        return ConversionOutcome::failed(
            file.name(),
            ConversionError::UnsupportedFileType {
                file_name: file.name().to_string(),
            },
        );
    };

    match AssertUnwindSafe(converter.convert_file(file, kind, Some(params)))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "converter panicked".to_string());
            ConversionOutcome::failed(file.name(), ConversionError::Unexpected { detail })
        }
    }
}
