//! Wire records for the Ashby API.
//!
//! Required fields are non-optional; a payload missing one fails to decode.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::models::{Candidate, InterviewStage, JobPosting, NOT_AVAILABLE};

/// Common response envelope. `results` stays untyped until `success` has been checked.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub more_data_available: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub errors: Option<Value>,
    #[serde(default)]
    pub error_info: Option<ErrorInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    /// Flattens `errors` (string or list of strings) and `errorInfo` into one message.
    pub fn error_message(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        match &self.errors {
            Some(Value::String(s)) => parts.push(s.clone()),
            Some(Value::Array(items)) => parts.extend(items.iter().map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })),
            Some(Value::Null) | None => {}
            Some(other) => parts.push(other.to_string()),
        }
        if let Some(info) = &self.error_info {
            parts.extend(info.code.iter().cloned());
            parts.extend(info.message.iter().cloned());
        }
        if parts.is_empty() {
            "request was not successful".to_string()
        } else {
            parts.join("; ")
        }
    }

    /// Ashby reports unknown ids with codes such as `job_not_found`.
    pub fn is_not_found(&self) -> bool {
        self.error_message().to_ascii_lowercase().contains("not_found")
    }
}

#[derive(Debug, Deserialize)]
pub struct NamedRecord {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub department: Option<NamedRecord>,
    #[serde(default)]
    pub location: Option<NamedRecord>,
}

impl From<JobRecord> for JobPosting {
    fn from(record: JobRecord) -> Self {
        JobPosting {
            id: record.id,
            title: record.title,
            status: record.status.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            department_name: name_or_placeholder(record.department),
            location_name: name_or_placeholder(record.location),
        }
    }
}

fn name_or_placeholder(named: Option<NamedRecord>) -> String {
    named
        .and_then(|n| n.name)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfoRecord {
    #[serde(default)]
    pub default_interview_plan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStageRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub stage_type: Option<String>,
    #[serde(default)]
    pub order_in_interview_plan: Option<i64>,
}

impl From<InterviewStageRecord> for InterviewStage {
    fn from(record: InterviewStageRecord) -> Self {
        InterviewStage {
            id: record.id,
            title: record.title,
            stage_type: record.stage_type,
            order_in_interview_plan: record.order_in_interview_plan,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StageRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailRecord {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCandidateRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_email_address: Option<EmailRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub candidate: ApplicationCandidateRecord,
    #[serde(default)]
    pub current_interview_stage: Option<StageRef>,
}

impl From<ApplicationRecord> for Candidate {
    fn from(record: ApplicationRecord) -> Self {
        let (stage_id, stage) = match record.current_interview_stage {
            Some(stage) => (stage.id, stage.title),
            None => (None, None),
        };
        Candidate {
            id: record.candidate.id,
            name: record.candidate.name,
            email: record
                .candidate
                .primary_email_address
                .and_then(|e| e.value)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            application_id: record.id,
            application_date: record.created_at.as_deref().and_then(parse_timestamp),
            stage,
            stage_id,
            resume_file_handle: None,
        }
    }
}

/// Unparseable timestamps become `None` so they sort with the missing ones.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
pub struct FileHandleRecord {
    pub handle: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInfoRecord {
    #[serde(default)]
    pub resume_file_handle: Option<FileHandleRecord>,
}

#[derive(Debug, Deserialize)]
pub struct FileInfoRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_record_defaults_missing_names() {
        let record: JobRecord = serde_json::from_value(json!({
            "id": "job-1",
            "title": "Software Engineer",
            "department": {"name": "Engineering"},
            "location": null
        }))
        .unwrap();
        let job = JobPosting::from(record);
        assert_eq!(job.department_name, "Engineering");
        assert_eq!(job.location_name, NOT_AVAILABLE);
        assert_eq!(job.status, NOT_AVAILABLE);
    }

    #[test]
    fn test_job_record_without_title_is_rejected() {
        let result = serde_json::from_value::<JobRecord>(json!({"id": "job-1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_application_maps_to_candidate() {
        let record: ApplicationRecord = serde_json::from_value(json!({
            "id": "app-1",
            "createdAt": "2024-03-01T09:30:00.000Z",
            "candidate": {
                "id": "cand-1",
                "name": "Ada Lovelace",
                "primaryEmailAddress": {"value": "ada@example.com"}
            },
            "currentInterviewStage": {"id": "stage-1", "title": "Application Review"}
        }))
        .unwrap();
        let candidate = Candidate::from(record);
        assert_eq!(candidate.id, "cand-1");
        assert_eq!(candidate.application_id, "app-1");
        assert_eq!(candidate.email, "ada@example.com");
        assert_eq!(candidate.stage.as_deref(), Some("Application Review"));
        assert_eq!(candidate.stage_id.as_deref(), Some("stage-1"));
        assert_eq!(
            candidate.application_date.unwrap().to_rfc3339(),
            "2024-03-01T09:30:00+00:00"
        );
    }

    #[test]
    fn test_bad_timestamp_becomes_missing() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_error_message_flattens_sources() {
        let envelope: Envelope = serde_json::from_value(json!({
            "success": false,
            "errors": ["job_not_found"],
            "errorInfo": {"code": "job_not_found", "message": "Job not found"}
        }))
        .unwrap();
        assert_eq!(
            envelope.error_message(),
            "job_not_found; job_not_found; Job not found"
        );
        assert!(envelope.is_not_found());
    }

    #[test]
    fn test_generic_failure_is_not_not_found() {
        let envelope: Envelope =
            serde_json::from_value(json!({"success": false, "errors": "invalid_input"})).unwrap();
        assert!(!envelope.is_not_found());
    }
}
