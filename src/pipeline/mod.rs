//! Pipeline stages for label-to-ZPL conversion.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ validate ──▶ batch ──▶ request ──▶ archive
//! (path/bytes) (type, size) (sequential) (HTTP)  (ZIP)
//! ```
//!
//! 1. [`input`]    — wrap a path or in-memory bytes as an upload candidate
//! 2. [`validate`] — accept or reject candidates by extension and size
//! 3. [`batch`]    — drive the files one by one, reporting progress
//! 4. [`request`]  — the HTTP call to the conversion service; the only stage
//!    with network I/O
//! 5. [`archive`]  — package the successful results into a ZIP

pub mod archive;
pub mod batch;
pub mod input;
pub mod request;
pub mod validate;
