//! # labelzpl
//!
//! Convert shipping labels (PDF or PNG) into ZPL printer command text through
//! a remote conversion service.
//!
//! The service does the rendering. This crate validates what goes in,
//! builds the HTTP requests, converts batches one file at a time with
//! progress reporting, and packages the ZPL results into a ZIP archive.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Input     local path or in-memory bytes
//!  ├─ 2. Validate  extension allow-list + size limit
//!  ├─ 3. Batch     sequential, per-file outcome, progress + cancellation
//!  ├─ 4. Request   POST /convert/{pdf|png}/to/zpl with bearer auth
//!  └─ 5. Archive   one <stem>.txt per success, Deflate-compressed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labelzpl::{convert_single, ClientConfig, ConversionClient, ConversionParameters, UploadCandidate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential from LABELZPL_API_KEY, endpoint from LABELZPL_BASE_URL
//!     let client = ConversionClient::new(ClientConfig::from_env()?)?;
//!     let label = UploadCandidate::from_path("shipment.pdf").await?;
//!     let params = ConversionParameters::standard();
//!     let outcome = convert_single(&client, &label, Some(&params)).await?;
//!     println!("{}", outcome.content());
//!     Ok(())
//! }
//! ```
//!
//! For an interactive front end, [`Session`] wraps the same operations in a
//! state machine with observable state and batch progress.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `labelzpl` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! labelzpl = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use convert::{
    convert_and_package, convert_single, export_archive, export_text, export_zpl_to,
    render_to_pdf, BatchRun,
};
pub use error::{ConversionError, LabelZplError};
pub use output::{BatchReport, BatchSummary, ConversionOutcome};
pub use params::{
    apply_declaration_preset, ColorMode, ConversionMode, ConversionParameters,
    ConversionParametersBuilder,
};
pub use pipeline::archive::{default_archive_name, package_outcomes, ArchiveArtifact};
pub use pipeline::batch::convert_batch;
pub use pipeline::input::UploadCandidate;
pub use pipeline::request::{ConversionClient, LabelConverter, SourceKind};
pub use pipeline::validate::{validate_files, Rejection, UploadPolicy, ValidationReport};
pub use progress::{
    BatchProgress, BatchProgressCallback, NoopProgressCallback, ProgressCallback,
    ProgressTracker,
};
pub use session::{Session, SessionResult, SessionState};
pub use tokio_util::sync::CancellationToken;
