use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Placeholder used when the upstream omits a descriptive field.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub status: String,
    pub department_name: String,
    pub location_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStage {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub stage_type: Option<String>,
    pub order_in_interview_plan: Option<i64>,
}

/// A candidate as seen through one of their applications to a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub application_id: String,
    #[serde(rename = "appliedAt")]
    pub application_date: Option<DateTime<Utc>>,
    /// Title of the application's current interview stage.
    pub stage: Option<String>,
    pub stage_id: Option<String>,
    pub resume_file_handle: Option<String>,
}

/// Resume bytes held only for the duration of a download response.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub candidate_id: String,
    pub filename: String,
    pub content: Bytes,
}
