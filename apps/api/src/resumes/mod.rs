pub mod handlers;

use crate::archive::{sanitize_file_stem, split_extension};

/// Archive entry name for a candidate's resume: the sanitized candidate name with the
/// resume's own extension. Falls back to `candidate_<n>` when nothing usable is left.
pub fn entry_name(position: usize, candidate_name: Option<&str>, resume_filename: &str) -> String {
    let stem = candidate_name.map(sanitize_file_stem).unwrap_or_default();
    let stem = if stem.is_empty() {
        format!("candidate_{}", position + 1)
    } else {
        stem
    };
    let (_, ext) = split_extension(resume_filename);
    let ext = if ext.is_empty() { ".pdf" } else { ext };
    format!("{stem}{ext}")
}
