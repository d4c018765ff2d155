//! Package successful batch outcomes into a ZIP archive.
//!
//! One `.txt` entry per successful outcome, flat, no directories. Failed
//! outcomes contribute nothing; they only show up in the batch summary.

use crate::error::LabelZplError;
use crate::output::ConversionOutcome;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A finished in-memory archive.
#[derive(Debug, Clone)]
pub struct ArchiveArtifact {
    /// The ZIP file bytes.
    pub bytes: Vec<u8>,
    /// Entry names, in the order they were written.
    pub entries: Vec<String>,
}

impl ArchiveArtifact {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace a trailing `.ext` with `.txt`, or append `.txt` if there is none.
///
/// ```rust
/// use labelzpl::pipeline::archive::archive_entry_name;
///
/// assert_eq!(archive_entry_name("label.pdf"), "label.txt");
/// assert_eq!(archive_entry_name("a.b.png"), "a.b.txt");
/// assert_eq!(archive_entry_name("README"), "README.txt");
/// ```
pub fn archive_entry_name(file_name: &str) -> String {
    format!("{}.txt", stem(file_name))
}

fn stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(i) if i + 1 < file_name.len() && !file_name[i + 1..].contains('/') => &file_name[..i],
        _ => file_name,
    }
}

/// Suggested download name: `converted_files_<UTC timestamp>.zip`.
pub fn default_archive_name(at: DateTime<Utc>) -> String {
    format!("converted_files_{}.zip", at.format("%Y-%m-%dT%H-%M-%S"))
}

/// Build a Deflate-compressed archive from the successful outcomes.
///
/// Two sources that map to the same entry name (`a.pdf` and `a.png`) are
/// kept apart as `a.txt` and `a_2.txt`.
///
/// # Errors
/// [`LabelZplError::ArchiveFailed`] if the ZIP writer fails.
pub fn package_outcomes(outcomes: &[ConversionOutcome]) -> Result<ArchiveArtifact, LabelZplError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();

    for outcome in outcomes.iter().filter(|o| o.is_success()) {
        let name = unique_entry_name(outcome.file_name(), &mut used);
        writer
            .start_file(name.as_str(), options)
            .map_err(archive_error)?;
        writer
            .write_all(outcome.content().as_bytes())
            .map_err(|e| LabelZplError::ArchiveFailed {
                detail: format!("writing '{name}': {e}"),
            })?;
        entries.push(name);
    }

    let bytes = writer.finish().map_err(archive_error)?.into_inner();
    debug!("Packaged {} entries into {} bytes", entries.len(), bytes.len());
    Ok(ArchiveArtifact { bytes, entries })
}

fn unique_entry_name(file_name: &str, used: &mut HashSet<String>) -> String {
    let base = stem(file_name);
    let mut candidate = format!("{base}.txt");
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{base}_{n}.txt");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

fn archive_error(e: zip::result::ZipError) -> LabelZplError {
    LabelZplError::ArchiveFailed {
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use chrono::TimeZone;
    use std::io::Read;

    fn read_entries(bytes: &[u8]) -> Vec<(String, String)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut f = archive.by_index(i).unwrap();
                let mut content = String::new();
                f.read_to_string(&mut content).unwrap();
                (f.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn only_successes_are_packaged() {
        let outcomes = vec![
            ConversionOutcome::succeeded("a.pdf", "X"),
            ConversionOutcome::failed(
                "b.pdf",
                ConversionError::Remote {
                    status: 500,
                    body: "bad".into(),
                },
            ),
        ];
        let artifact = package_outcomes(&outcomes).unwrap();
        assert_eq!(artifact.entries, vec!["a.txt"]);
        assert_eq!(read_entries(&artifact.bytes), vec![("a.txt".into(), "X".into())]);
    }

    #[test]
    fn packaging_twice_gives_same_entries() {
        let outcomes = vec![
            ConversionOutcome::succeeded("one.pdf", "^XA^FDone^FS^XZ"),
            ConversionOutcome::succeeded("two.png", "^XA^FDtwo^FS^XZ"),
        ];
        let first = package_outcomes(&outcomes).unwrap();
        let second = package_outcomes(&outcomes).unwrap();
        assert_eq!(read_entries(&first.bytes), read_entries(&second.bytes));
    }

    #[test]
    fn clashing_names_are_disambiguated() {
        let outcomes = vec![
            ConversionOutcome::succeeded("label.pdf", "1"),
            ConversionOutcome::succeeded("label.png", "2"),
            ConversionOutcome::succeeded("label.PDF", "3"),
        ];
        let artifact = package_outcomes(&outcomes).unwrap();
        assert_eq!(artifact.entries, vec!["label.txt", "label_2.txt", "label_3.txt"]);
        assert_eq!(read_entries(&artifact.bytes)[1].1, "2");
    }

    #[test]
    fn no_successes_gives_empty_valid_archive() {
        let artifact = package_outcomes(&[ConversionOutcome::failed(
            "a.pdf",
            ConversionError::Cancelled,
        )])
        .unwrap();
        assert!(artifact.is_empty());
        assert!(read_entries(&artifact.bytes).is_empty());
    }

    #[test]
    fn entry_names() {
        assert_eq!(archive_entry_name("shipment-42.PDF"), "shipment-42.txt");
        assert_eq!(archive_entry_name("trailing."), "trailing..txt");
        assert_eq!(archive_entry_name(".hidden"), ".txt");
    }

    #[test]
    fn default_name_uses_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 3).unwrap();
        assert_eq!(
            default_archive_name(at),
            "converted_files_2026-10-18T09-05-03.zip"
        );
    }
}
