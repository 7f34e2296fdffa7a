//! ZIP handling: building download archives and reading PDF uploads.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use thiserror::Error;
use tracing::warn;
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::pdf::PdfBlob;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid ZIP file: {0}")]
    InvalidArchive(String),

    #[error("No PDF files found in the ZIP")]
    NoPdfEntries,

    #[error("ZIP contents exceed {limit} bytes once extracted")]
    TooLarge { limit: usize },

    #[error("Duplicate archive entry name '{0}'")]
    DuplicateName(String),

    #[error("ZIP write failed: {0}")]
    Write(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub filename: String,
    pub content: Bytes,
}

impl ArchiveEntry {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Writes `entries` into a deflated ZIP, in the order given.
///
/// Names must already be unique; see [`unique_file_names`]. A repeated name is rejected
/// rather than silently renamed.
pub fn build_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.filename.as_str()) {
            return Err(ArchiveError::DuplicateName(entry.filename.clone()));
        }
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in entries {
        writer.start_file(entry.filename.as_str(), options)?;
        writer.write_all(&entry.content)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Makes every name unique by inserting ` (2)`, ` (3)`, … before the extension of the
/// second and later occurrences. First occurrences are left untouched.
pub fn unique_file_names<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let names: Vec<String> = names.into_iter().collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut unique = Vec::with_capacity(names.len());

    for name in names {
        let candidate = if taken.contains(&name) {
            let (stem, ext) = split_extension(&name);
            (2..)
                .map(|n| format!("{stem} ({n}){ext}"))
                .find(|c| !taken.contains(c))
                .unwrap_or_default()
        } else {
            name
        };
        taken.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}

/// Splits `"cv.final.pdf"` into `("cv.final", ".pdf")`. Dotfiles have no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Keeps alphanumerics, space, `-` and `_`, then trims.
pub fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Reads the PDF entries of an uploaded ZIP, ordered by entry name.
///
/// Directories, `__MACOSX/` metadata and non-`.pdf` entries are ignored. An entry that
/// cannot be decompressed is skipped with a warning. At most `max_total_bytes` are
/// extracted across all entries; sizes declared by the archive are not trusted.
pub fn read_pdf_entries(
    data: &[u8],
    max_total_bytes: usize,
) -> Result<Vec<PdfBlob>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| ArchiveError::InvalidArchive(e.to_string()))?;

    let mut found: Vec<(String, Bytes)> = Vec::new();
    let mut remaining = max_total_bytes;
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| ArchiveError::InvalidArchive(e.to_string()))?;
        let path = file.name().to_string();
        if file.is_dir() || path.starts_with("__MACOSX") || !path.to_lowercase().ends_with(".pdf")
        {
            continue;
        }

        let mut content = Vec::new();
        let budget = (remaining as u64).saturating_add(1);
        if let Err(e) = file.by_ref().take(budget).read_to_end(&mut content) {
            warn!("Skipping unreadable archive entry {path}: {e}");
            continue;
        }
        if content.len() > remaining {
            return Err(ArchiveError::TooLarge {
                limit: max_total_bytes,
            });
        }
        remaining -= content.len();
        found.push((path, Bytes::from(content)));
    }

    if found.is_empty() {
        return Err(ArchiveError::NoPdfEntries);
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found
        .into_iter()
        .map(|(path, data)| PdfBlob {
            name: path.rsplit('/').next().unwrap_or(&path).to_string(),
            data,
        })
        .collect())
}
