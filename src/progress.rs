//! Progress-callback trait and accumulator for batch conversions.
//!
//! Pass an [`Arc<dyn BatchProgressCallback>`] to
//! [`crate::pipeline::batch::convert_batch`] to receive events as each file
//! is processed.
//!
//! The orchestrator is strictly sequential, so events arrive in order and
//! `processed` only ever grows. For a batch of N files that is not cancelled,
//! [`BatchProgressCallback::on_progress`] fires exactly N + 1 times: once
//! before each file with `processed = i`, and once at the end with
//! `processed = total = N` and an empty file name.
//!
//! # Example
//!
//! ```rust
//! use labelzpl::BatchProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl BatchProgressCallback for Counter {
//!     fn on_progress(&self, processed: usize, total: usize, current_file: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{processed}/{total} {current_file}");
//!     }
//! }
//! ```

use crate::output::ConversionOutcome;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Called by the batch orchestrator as it works through the files.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called before file `processed` starts, and once more at the end.
    ///
    /// # Arguments
    /// * `processed`    — files finished so far (0-based index of the next file)
    /// * `total`        — files in the batch
    /// * `current_file` — name of the file about to start; empty on the final call
    fn on_progress(&self, processed: usize, total: usize, current_file: &str) {
        let _ = (processed, total, current_file);
    }

    /// Called after each attempted file with its outcome.
    ///
    /// # Arguments
    /// * `index`   — 0-based position of the file in the batch
    /// * `total`   — files in the batch
    /// * `outcome` — the recorded result for that file
    fn on_file_complete(&self, index: usize, total: usize, outcome: &ConversionOutcome) {
        let _ = (index, total, outcome);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias for a shared callback.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

/// Snapshot of a running batch, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub processed_count: usize,
    pub total_count: usize,
    pub current_file_name: String,
    pub is_processing: bool,
}

impl BatchProgress {
    /// Completed fraction in percent, 0 for an empty batch.
    pub fn percent(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.processed_count as f64 * 100.0 / self.total_count as f64
        }
    }

    pub fn remaining(&self) -> usize {
        self.total_count.saturating_sub(self.processed_count)
    }
}

/// Keeps the latest [`BatchProgress`] and forwards events to an optional
/// inner callback.
///
/// The orchestrator is the only writer; any number of readers may call
/// [`ProgressTracker::snapshot`].
pub struct ProgressTracker {
    state: Mutex<BatchProgress>,
    inner: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(inner: Option<ProgressCallback>) -> Self {
        Self {
            state: Mutex::new(BatchProgress::default()),
            inner,
        }
    }

    pub fn snapshot(&self) -> BatchProgress {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Return to the zero state once a batch is over.
    pub fn reset(&self) {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = BatchProgress::default();
    }
}

impl BatchProgressCallback for ProgressTracker {
    fn on_progress(&self, processed: usize, total: usize, current_file: &str) {
        {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *state = BatchProgress {
                processed_count: processed,
                total_count: total,
                current_file_name: current_file.to_string(),
                is_processing: processed < total,
            };
        }
        if let Some(ref cb) = self.inner {
            cb.on_progress(processed, total, current_file);
        }
    }

    fn on_file_complete(&self, index: usize, total: usize, outcome: &ConversionOutcome) {
        if let Some(ref cb) = self.inner {
            cb.on_file_complete(index, total, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCallback {
        progress: Arc<AtomicUsize>,
        completes: Arc<AtomicUsize>,
    }

    impl BatchProgressCallback for CountingCallback {
        fn on_progress(&self, _processed: usize, _total: usize, _current_file: &str) {
            self.progress.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _outcome: &ConversionOutcome) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_progress(0, 2, "a.pdf");
        cb.on_file_complete(0, 2, &ConversionOutcome::succeeded("a.pdf", "X"));
        cb.on_progress(2, 2, "");
    }

    #[test]
    fn tracker_records_latest_snapshot() {
        let tracker = ProgressTracker::new(None);
        tracker.on_progress(1, 3, "b.png");

        let snap = tracker.snapshot();
        assert_eq!(snap.processed_count, 1);
        assert_eq!(snap.total_count, 3);
        assert_eq!(snap.current_file_name, "b.png");
        assert!(snap.is_processing);
        assert_eq!(snap.remaining(), 2);

        tracker.on_progress(3, 3, "");
        assert!(!tracker.snapshot().is_processing);
        assert_eq!(tracker.snapshot().percent(), 100.0);

        tracker.reset();
        assert_eq!(tracker.snapshot(), BatchProgress::default());
    }

    #[test]
    fn tracker_forwards_to_inner() {
        let progress = Arc::new(AtomicUsize::new(0));
        let completes = Arc::new(AtomicUsize::new(0));
        let inner: ProgressCallback = Arc::new(CountingCallback {
            progress: Arc::clone(&progress),
            completes: Arc::clone(&completes),
        });
        let tracker = ProgressTracker::new(Some(inner));

        tracker.on_progress(0, 1, "a.pdf");
        tracker.on_file_complete(0, 1, &ConversionOutcome::succeeded("a.pdf", "X"));
        tracker.on_progress(1, 1, "");

        assert_eq!(progress.load(Ordering::SeqCst), 2);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_batch_percent_is_zero() {
        assert_eq!(BatchProgress::default().percent(), 0.0);
    }
}
