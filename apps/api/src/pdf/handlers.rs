use axum::{
    extract::{Multipart, State},
    response::Response,
};
use bytes::Bytes;
use tracing::info;

use super::{combine_all, group};
use crate::archive::{build_archive, read_pdf_entries, ArchiveEntry};
use crate::download::{attachment, ZIP_CONTENT_TYPE};
use crate::errors::AppError;
use crate::state::AppState;

pub const ARCHIVE_FILENAME: &str = "combined_pdfs.zip";
pub const ERROR_REPORT_FILENAME: &str = "combine_errors.txt";
pub const FAILED_GROUPS_HEADER: &str = "x-failed-groups";
/// Extracted PDFs may total at most this multiple of the upload size limit.
pub const EXTRACTION_RATIO: usize = 4;

/// Output of one combine run, ready to be served.
#[derive(Debug)]
pub struct CombinedArchive {
    pub archive: Vec<u8>,
    pub pdf_count: usize,
    pub group_count: usize,
    pub failed_groups: Vec<usize>,
}

pub fn output_filename(group_number: usize) -> String {
    format!("combined_{group_number:03}.pdf")
}

/// Reads the upload, groups its PDFs and combines each group into one entry of the
/// returned ZIP. Failed groups are listed in a text report inside the archive; the run
/// only fails when no group could be combined.
pub fn combine_upload(
    upload: &[u8],
    group_size: usize,
    extract_limit: usize,
) -> Result<CombinedArchive, AppError> {
    let pdfs = read_pdf_entries(upload, extract_limit)?;
    let pdf_count = pdfs.len();
    let groups = group(pdfs, group_size)?;
    let group_count = groups.len();

    let mut entries = Vec::with_capacity(group_count + 1);
    let mut failed_groups = Vec::new();
    let mut report = Vec::new();
    for outcome in combine_all(&groups) {
        match outcome.result {
            Ok(data) => entries.push(ArchiveEntry::new(output_filename(outcome.number), data)),
            Err(e) => {
                report.push(format!(
                    "Group {} ({}): {e}",
                    outcome.number,
                    outcome.member_names.join(", ")
                ));
                failed_groups.push(outcome.number);
            }
        }
    }

    if entries.is_empty() {
        return Err(AppError::UnprocessableInput(format!(
            "No group could be combined. {}",
            report.join("; ")
        )));
    }
    if !report.is_empty() {
        entries.push(ArchiveEntry::new(
            ERROR_REPORT_FILENAME,
            format!("{}\n", report.join("\n")).into_bytes(),
        ));
    }

    Ok(CombinedArchive {
        archive: build_archive(&entries)?,
        pdf_count,
        group_count,
        failed_groups,
    })
}

fn parse_group_size(raw: &str) -> Result<usize, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::InvalidArgument(format!(
            "pdfsPerFile must be a positive whole number, got '{}'",
            raw.trim()
        ))
    })
}

/// POST /api/pdfs/combine (multipart: `zipfile`, optional `pdfsPerFile`)
pub async fn handle_combine(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload: Option<Bytes> = None;
    let mut group_size = state.config.default_pdfs_per_file;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidArgument(format!("Malformed upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "zipfile" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidArgument(format!("Failed to read upload: {e}")))?;
                upload = Some(data);
            }
            "pdfsPerFile" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidArgument(format!("Failed to read field: {e}")))?;
                group_size = parse_group_size(&raw)?;
            }
            _ => {}
        }
    }

    let upload = upload
        .filter(|data| !data.is_empty())
        .ok_or_else(|| AppError::InvalidArgument("No ZIP file provided".to_string()))?;

    let extract_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(EXTRACTION_RATIO);
    let combined =
        tokio::task::spawn_blocking(move || combine_upload(&upload, group_size, extract_limit))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

    info!(
        "Combined {} PDFs into {} groups of up to {group_size} ({} failed)",
        combined.pdf_count,
        combined.group_count,
        combined.failed_groups.len()
    );

    let extra = if combined.failed_groups.is_empty() {
        Vec::new()
    } else {
        let numbers: Vec<String> = combined.failed_groups.iter().map(usize::to_string).collect();
        vec![(FAILED_GROUPS_HEADER, numbers.join(","))]
    };
    attachment(ARCHIVE_FILENAME, ZIP_CONTENT_TYPE, combined.archive, &extra)
}
