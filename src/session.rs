//! Conversion session: the state machine behind the front end.
//!
//! ```text
//! Idle ─▶ Validating ─▶ Idle ─┬─▶ Converting ───────────────────▶ Done
//!                             └─▶ BatchConverting ─▶ Packaging ─▶ Done
//!                  any step ──▶ Error ──(select_files / reset)──▶ Idle
//! ```
//!
//! A [`Session`] owns the selected files, the current parameters and the
//! last result. The current [`SessionState`] is published on a
//! `tokio::sync::watch` channel so a display can follow it while a
//! conversion is running; batch progress is available from
//! [`Session::progress`].

use crate::convert::{convert_and_package, convert_single};
use crate::error::LabelZplError;
use crate::output::{BatchReport, ConversionOutcome};
use crate::params::{apply_declaration_preset, ConversionParameters};
use crate::pipeline::archive::ArchiveArtifact;
use crate::pipeline::input::UploadCandidate;
use crate::pipeline::request::LabelConverter;
use crate::pipeline::validate::{validate_files, Rejection, UploadPolicy};
use crate::progress::{
    BatchProgress, BatchProgressCallback, ProgressCallback, ProgressTracker,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Validating,
    Converting { file_name: String },
    BatchConverting,
    Packaging,
    Done,
    /// The last operation failed with this user-facing message.
    Error(String),
}

/// What the last successful (or partially successful) run produced.
#[derive(Debug, Clone)]
pub enum SessionResult {
    Single(ConversionOutcome),
    Batch {
        report: BatchReport,
        /// `None` when packaging failed; the report is still valid.
        archive: Option<ArchiveArtifact>,
    },
}

pub struct Session {
    converter: Arc<dyn LabelConverter>,
    policy: UploadPolicy,
    params: ConversionParameters,
    declaration_mode: bool,
    selected: Vec<UploadCandidate>,
    rejected: Vec<Rejection>,
    result: Option<SessionResult>,
    state: watch::Sender<SessionState>,
    tracker: Arc<ProgressTracker>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("policy", &self.policy)
            .field("params", &self.params)
            .field("declaration_mode", &self.declaration_mode)
            .field("selected", &self.selected.len())
            .field("rejected", &self.rejected.len())
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start an idle session with the standard parameters.
    pub fn new(converter: Arc<dyn LabelConverter>, policy: UploadPolicy) -> Self {
        Self {
            converter,
            policy,
            params: ConversionParameters::standard(),
            declaration_mode: false,
            selected: Vec::new(),
            rejected: Vec::new(),
            result: None,
            state: watch::channel(SessionState::Idle).0,
            tracker: Arc::new(ProgressTracker::new(None)),
            cancel: CancellationToken::new(),
        }
    }

    /// Forward batch progress events to `callback` as well.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.tracker = Arc::new(ProgressTracker::new(Some(callback)));
        self
    }

    pub fn converter(&self) -> &Arc<dyn LabelConverter> {
        &self.converter
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Latest batch progress; the zero state outside a batch.
    pub fn progress(&self) -> BatchProgress {
        self.tracker.snapshot()
    }

    /// Token that stops a running batch before its next file.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn params(&self) -> &ConversionParameters {
        &self.params
    }

    /// Replace the parameters. An active declaration preset is re-applied.
    pub fn set_params(&mut self, params: ConversionParameters) {
        self.params = if self.declaration_mode {
            apply_declaration_preset(params, true)
        } else {
            params
        };
    }

    pub fn declaration_mode(&self) -> bool {
        self.declaration_mode
    }

    pub fn set_declaration_mode(&mut self, enabled: bool) {
        self.declaration_mode = enabled;
        self.params = apply_declaration_preset(std::mem::take(&mut self.params), enabled);
    }

    pub fn selected_files(&self) -> &[UploadCandidate] {
        &self.selected
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejected
    }

    /// More than one file selected.
    pub fn is_batch_mode(&self) -> bool {
        self.selected.len() > 1
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Validate and select files, replacing any previous selection.
    ///
    /// Returns the rejections. If every candidate was rejected the session
    /// moves to [`SessionState::Error`]; otherwise it is back to `Idle`.
    pub fn select_files(&mut self, candidates: Vec<UploadCandidate>) -> &[Rejection] {
        self.state.send_replace(SessionState::Validating);
        self.result = None;
        self.refresh_cancel_token();

        let report = validate_files(candidates, &self.policy);
        debug!(
            "Selected {} files, rejected {}",
            report.accepted.len(),
            report.rejected.len()
        );
        let next = match report.rejection_message() {
            Some(msg) if report.accepted.is_empty() => SessionState::Error(msg),
            _ => SessionState::Idle,
        };
        self.selected = report.accepted;
        self.rejected = report.rejected;
        self.state.send_replace(next);
        &self.rejected
    }

    /// Convert the selection: single mode for one file, batch mode otherwise.
    pub async fn convert(&mut self) -> Result<&SessionResult, LabelZplError> {
        match self.selected.len() {
            0 => Err(self.fail(LabelZplError::NoFilesSelected)),
            1 => self.convert_single().await,
            _ => self.convert_batch().await,
        }
    }

    /// Convert exactly one selected file.
    pub async fn convert_single(&mut self) -> Result<&SessionResult, LabelZplError> {
        let file = match self.selected.as_slice() {
            [] => return Err(self.fail(LabelZplError::NoFilesSelected)),
            [file] => file.clone(),
            many => {
                let count = many.len();
                return Err(self.fail(LabelZplError::MultipleFilesSelected { count }));
            }
        };

        self.result = None;
        self.state.send_replace(SessionState::Converting {
            file_name: file.name().to_string(),
        });

        match convert_single(&*self.converter, &file, Some(&self.params)).await {
            Ok(outcome) => {
                self.state.send_replace(SessionState::Done);
                Ok(&*self.result.insert(SessionResult::Single(outcome)))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Convert every selected file in order and package the results.
    pub async fn convert_batch(&mut self) -> Result<&SessionResult, LabelZplError> {
        if self.selected.is_empty() {
            return Err(self.fail(LabelZplError::NoFilesSelected));
        }

        self.result = None;
        self.state.send_replace(SessionState::BatchConverting);

        let progress = SessionProgress {
            tracker: &self.tracker,
            state: &self.state,
        };
        let run = convert_and_package(
            &*self.converter,
            &self.selected,
            &self.params,
            &progress,
            &self.cancel,
        )
        .await;
        self.tracker.reset();

        match run.archive {
            Ok(archive) => {
                info!("Session batch done: {}", run.report.summary);
                self.state.send_replace(SessionState::Done);
                Ok(&*self.result.insert(SessionResult::Batch {
                    report: run.report,
                    archive: Some(archive),
                }))
            }
            Err(e) => {
                self.result = Some(SessionResult::Batch {
                    report: run.report,
                    archive: None,
                });
                Err(self.fail(e))
            }
        }
    }

    /// Clear selection and result, restore standard parameters, go `Idle`.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.rejected.clear();
        self.result = None;
        self.params = ConversionParameters::standard();
        self.declaration_mode = false;
        self.tracker.reset();
        self.refresh_cancel_token();
        self.state.send_replace(SessionState::Idle);
    }

    fn fail(&self, e: LabelZplError) -> LabelZplError {
        self.state.send_replace(SessionState::Error(e.to_string()));
        e
    }

    fn refresh_cancel_token(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
    }
}

/// Feeds the tracker and moves the session to `Packaging` once the
/// orchestrator reports completion.
struct SessionProgress<'a> {
    tracker: &'a ProgressTracker,
    state: &'a watch::Sender<SessionState>,
}

impl BatchProgressCallback for SessionProgress<'_> {
    fn on_progress(&self, processed: usize, total: usize, current_file: &str) {
        if processed == total {
            self.state.send_replace(SessionState::Packaging);
        }
        self.tracker.on_progress(processed, total, current_file);
    }

    fn on_file_complete(&self, index: usize, total: usize, outcome: &ConversionOutcome) {
        self.tracker.on_file_complete(index, total, outcome);
    }
}
