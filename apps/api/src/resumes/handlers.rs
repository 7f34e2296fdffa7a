use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::entry_name;
use crate::archive::{build_archive, unique_file_names, ArchiveEntry};
use crate::download::{attachment, ZIP_CONTENT_TYPE};
use crate::errors::AppError;
use crate::state::AppState;

pub const ARCHIVE_FILENAME: &str = "candidate_resumes.zip";
pub const SKIPPED_HEADER: &str = "x-skipped-candidates";

#[derive(Debug, Deserialize)]
pub struct SelectedCandidate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    pub candidates: Vec<SelectedCandidate>,
}

/// GET /api/candidates/:candidate_id/resume
pub async fn handle_download_resume(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
) -> Result<Response, AppError> {
    let resume = state.ats.fetch_resume(&candidate_id).await?;
    let content_type = mime_guess::from_path(&resume.filename)
        .first_or_octet_stream()
        .to_string();
    info!(
        "Serving resume {} for candidate {} ({} bytes)",
        resume.filename,
        resume.candidate_id,
        resume.content.len()
    );
    attachment(&resume.filename, &content_type, resume.content, &[])
}

/// POST /api/resumes/archive
///
/// Fetches each selected resume in turn. Candidates whose resume cannot be fetched are
/// left out and counted in `x-skipped-candidates`; the request fails only when none
/// could be fetched.
pub async fn handle_download_archive(
    State(state): State<AppState>,
    Json(req): Json<ArchiveRequest>,
) -> Result<Response, AppError> {
    if req.candidates.is_empty() {
        return Err(AppError::InvalidArgument("No candidates selected".to_string()));
    }

    let mut names = Vec::with_capacity(req.candidates.len());
    let mut contents = Vec::with_capacity(req.candidates.len());
    let mut first_error: Option<AppError> = None;
    let mut skipped = 0usize;

    for (position, candidate) in req.candidates.iter().enumerate() {
        match state.ats.fetch_resume(&candidate.id).await {
            Ok(resume) => {
                names.push(entry_name(position, candidate.name.as_deref(), &resume.filename));
                contents.push(resume.content);
            }
            Err(e) => {
                warn!("Skipping candidate {}: {e}", candidate.id);
                skipped += 1;
                first_error.get_or_insert(e.into());
            }
        }
    }

    if contents.is_empty() {
        return Err(first_error
            .unwrap_or_else(|| AppError::NotFound("No resumes available".to_string())));
    }

    let entries: Vec<ArchiveEntry> = unique_file_names(names)
        .into_iter()
        .zip(contents)
        .map(|(name, content)| ArchiveEntry::new(name, content))
        .collect();
    let count = entries.len();
    let archive = tokio::task::spawn_blocking(move || build_archive(&entries))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    info!("Built resume archive: {count} files, {skipped} skipped");
    let extra = if skipped > 0 {
        vec![(SKIPPED_HEADER, skipped.to_string())]
    } else {
        Vec::new()
    };
    attachment(ARCHIVE_FILENAME, ZIP_CONTENT_TYPE, archive, &extra)
}
