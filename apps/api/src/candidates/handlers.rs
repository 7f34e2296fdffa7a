use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{filter_and_sort, SortKey, SortOrder, APPLICATION_REVIEW_STAGE};
use crate::ashby::models::{Candidate, InterviewStage, JobPosting};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CandidateQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateListResponse {
    pub job_id: String,
    pub stage: &'static str,
    /// Applications to the job across every stage, before filtering.
    pub total_applications: usize,
    pub candidates: Vec<Candidate>,
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    let jobs = state.ats.list_jobs().await?;
    info!("Listed {} jobs", jobs.len());
    Ok(Json(jobs))
}

/// GET /api/jobs/:job_id/stages
pub async fn handle_list_stages(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<InterviewStage>>, AppError> {
    Ok(Json(state.ats.list_stages(&job_id).await?))
}

/// GET /api/jobs/:job_id/candidates?sort=name|date&order=asc|desc
///
/// Only candidates in Application Review are returned. Resume handles are looked up
/// one candidate at a time after filtering; a failed lookup leaves the handle empty.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(params): Query<CandidateQuery>,
) -> Result<Json<CandidateListResponse>, AppError> {
    let key = params
        .sort
        .as_deref()
        .map(str::parse::<SortKey>)
        .transpose()?
        .unwrap_or_default();
    let order = params
        .order
        .as_deref()
        .map(str::parse::<SortOrder>)
        .transpose()?
        .unwrap_or_default();

    let applications = state.ats.list_candidates(&job_id).await?;
    let total_applications = applications.len();
    let mut candidates =
        filter_and_sort(applications, APPLICATION_REVIEW_STAGE, key, order.is_ascending());

    for candidate in candidates.iter_mut() {
        match state.ats.resume_handle(&candidate.id).await {
            Ok(handle) => candidate.resume_file_handle = handle,
            Err(e) => warn!("Resume lookup failed for candidate {}: {e}", candidate.id),
        }
    }

    info!(
        "Job {job_id}: {} of {total_applications} applications in {APPLICATION_REVIEW_STAGE}",
        candidates.len()
    );
    Ok(Json(CandidateListResponse {
        job_id,
        stage: APPLICATION_REVIEW_STAGE,
        total_applications,
        candidates,
    }))
}
