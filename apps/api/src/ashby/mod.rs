//! Ashby client. The single point of entry for all calls to the applicant tracking system.
//!
//! Every endpoint is an HTTP POST of a JSON body authenticated with the API key as the
//! basic-auth username. Failed calls surface immediately; nothing is retried.
use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub mod models;
pub mod records;

use models::{Candidate, InterviewStage, JobPosting, ResumeFile};
use records::{
    ApplicationRecord, CandidateInfoRecord, Envelope, FileHandleRecord, FileInfoRecord,
    InterviewStageRecord, JobInfoRecord, JobRecord,
};

const DEFAULT_RESUME_FILENAME: &str = "resume.pdf";

#[derive(Debug, Error)]
pub enum AshbyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ashby API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Empty response from Ashby endpoint {endpoint}")]
    EmptyResponse { endpoint: String },

    #[error("Malformed response from Ashby endpoint {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("No download URL available for file {0}")]
    MissingFileUrl(String),

    #[error("File download failed with status {status}")]
    Download { status: u16 },
}

impl AshbyError {
    /// HTTP status reported by the upstream, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            AshbyError::Http(e) => e.status().map(|s| s.as_u16()),
            AshbyError::Api { status, .. } | AshbyError::Download { status } => Some(*status),
            _ => None,
        }
    }
}

/// Read operations the request handlers need from the ATS.
#[async_trait]
pub trait AtsClient: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<JobPosting>, AshbyError>;

    /// Stages of the job's default interview plan. Empty when the job has no plan.
    async fn list_stages(&self, job_id: &str) -> Result<Vec<InterviewStage>, AshbyError>;

    /// Candidates with an application to `job_id`, without resume handles.
    async fn list_candidates(&self, job_id: &str) -> Result<Vec<Candidate>, AshbyError>;

    async fn resume_handle(&self, candidate_id: &str) -> Result<Option<String>, AshbyError>;

    async fn fetch_resume(&self, candidate_id: &str) -> Result<ResumeFile, AshbyError>;
}

#[derive(Clone)]
pub struct AshbyClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AshbyClient {
    pub fn new(api_key: String, base_url: String, timeout: std::time::Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
        }
    }

    /// Makes one call and checks the envelope. `success: false` becomes an error.
    async fn call(&self, endpoint: &str, body: &Value) -> Result<Envelope, AshbyError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.api_key, Some(""))
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&text)
                .map(|e| e.error_message())
                .unwrap_or(text);
            warn!("Ashby {endpoint} returned {status}");
            return Err(AshbyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Err(AshbyError::EmptyResponse {
                endpoint: endpoint.to_string(),
            });
        }

        let envelope: Envelope =
            serde_json::from_str(&text).map_err(|e| AshbyError::Malformed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        if !envelope.success {
            let message = envelope.error_message();
            if envelope.is_not_found() {
                return Err(AshbyError::NotFound(format!("{endpoint}: {message}")));
            }
            return Err(AshbyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(envelope)
    }

    async fn results<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<T, AshbyError> {
        let envelope = self.call(endpoint, body).await?;
        decode(endpoint, envelope.results)
    }

    /// Follows `nextCursor` until the upstream reports no more data or repeats a cursor.
    async fn paginated<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filter: Value,
    ) -> Result<Vec<T>, AshbyError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();
        let mut pages = 0u32;

        loop {
            let mut body = filter.clone();
            if let (Some(c), Some(map)) = (&cursor, body.as_object_mut()) {
                map.insert("cursor".to_string(), Value::String(c.clone()));
            }

            let envelope = self.call(endpoint, &body).await?;
            pages += 1;
            let page: Vec<T> = decode(endpoint, envelope.results)?;
            all.extend(page);

            match envelope.next_cursor {
                Some(next) if envelope.more_data_available => {
                    if !seen.insert(next.clone()) {
                        warn!("Ashby {endpoint} repeated cursor {next}; stopping pagination");
                        break;
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        debug!("Ashby {endpoint}: {} records over {pages} page(s)", all.len());
        Ok(all)
    }

    async fn resume_file_handle(
        &self,
        candidate_id: &str,
    ) -> Result<Option<FileHandleRecord>, AshbyError> {
        let info: CandidateInfoRecord = self
            .results("candidate.info", &json!({ "id": candidate_id }))
            .await?;
        Ok(info.resume_file_handle)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, results: Option<Value>) -> Result<T, AshbyError> {
    let value = results.ok_or_else(|| AshbyError::Malformed {
        endpoint: endpoint.to_string(),
        reason: "missing results".to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| AshbyError::Malformed {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl AtsClient for AshbyClient {
    async fn list_jobs(&self) -> Result<Vec<JobPosting>, AshbyError> {
        let records: Vec<JobRecord> = self.paginated("job.list", json!({})).await?;
        Ok(records.into_iter().map(JobPosting::from).collect())
    }

    async fn list_stages(&self, job_id: &str) -> Result<Vec<InterviewStage>, AshbyError> {
        let job: JobInfoRecord = self.results("job.info", &json!({ "id": job_id })).await?;
        let Some(plan_id) = job.default_interview_plan_id else {
            return Ok(Vec::new());
        };
        let stages: Vec<InterviewStageRecord> = self
            .results(
                "interviewStage.list",
                &json!({ "interviewPlanId": plan_id }),
            )
            .await?;
        Ok(stages.into_iter().map(InterviewStage::from).collect())
    }

    async fn list_candidates(&self, job_id: &str) -> Result<Vec<Candidate>, AshbyError> {
        let applications: Vec<ApplicationRecord> = self
            .paginated("application.list", json!({ "jobId": job_id }))
            .await?;
        Ok(applications.into_iter().map(Candidate::from).collect())
    }

    async fn resume_handle(&self, candidate_id: &str) -> Result<Option<String>, AshbyError> {
        Ok(self
            .resume_file_handle(candidate_id)
            .await?
            .map(|record| record.handle))
    }

    async fn fetch_resume(&self, candidate_id: &str) -> Result<ResumeFile, AshbyError> {
        let handle = self
            .resume_file_handle(candidate_id)
            .await?
            .ok_or_else(|| AshbyError::NotFound(format!("Resume for candidate {candidate_id}")))?;

        let info: FileInfoRecord = self
            .results("file.info", &json!({ "fileHandle": handle.handle }))
            .await?;
        let url = info
            .url
            .ok_or_else(|| AshbyError::MissingFileUrl(handle.handle.clone()))?;

        // Signed URL: no credentials on this request.
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AshbyError::Download {
                status: status.as_u16(),
            });
        }
        let content = response.bytes().await?;

        Ok(ResumeFile {
            candidate_id: candidate_id.to_string(),
            filename: info
                .name
                .or(handle.name)
                .unwrap_or_else(|| DEFAULT_RESUME_FILENAME.to_string()),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use std::time::Duration;

    /// base64("test-key:")
    const EXPECTED_AUTH: &str = "Basic dGVzdC1rZXk6";

    async fn spawn_upstream<F>(build: F) -> String
    where
        F: FnOnce(String) -> Router,
    {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let router = build(base_url.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        base_url
    }

    fn client_for(base_url: String) -> AshbyClient {
        AshbyClient::new("test-key".to_string(), base_url, Duration::from_secs(5))
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v == EXPECTED_AUTH)
    }

    async fn job_list(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({"success": false}))).into_response();
        }
        let page = match body.get("cursor").and_then(Value::as_str) {
            None => json!({
                "success": true,
                "results": [{"id": "job-1", "title": "Software Engineer", "status": "Open",
                             "department": {"name": "Engineering"}}],
                "moreDataAvailable": true,
                "nextCursor": "page-2"
            }),
            Some("page-2") => json!({
                "success": true,
                "results": [{"id": "job-2", "title": "Designer"}],
                "moreDataAvailable": false
            }),
            Some(_) => json!({"success": false, "errors": ["invalid_cursor"]}),
        };
        Json(page).into_response()
    }

    #[tokio::test]
    async fn test_list_jobs_follows_cursor() {
        let base = spawn_upstream(|_| Router::new().route("/job.list", post(job_list))).await;
        let jobs = client_for(base).list_jobs().await.unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Software Engineer");
        assert_eq!(jobs[0].department_name, "Engineering");
        assert_eq!(jobs[1].id, "job-2");
        assert_eq!(jobs[1].location_name, models::NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn test_cursor_cycle_stops_pagination() {
        let base = spawn_upstream(|_| {
            Router::new().route(
                "/job.list",
                post(|Json(body): Json<Value>| async move {
                    let (id, next) = match body.get("cursor").and_then(Value::as_str) {
                        None => ("job-1", "a"),
                        Some("a") => ("job-2", "b"),
                        Some(_) => ("job-3", "a"),
                    };
                    Json(json!({
                        "success": true,
                        "results": [{"id": id, "title": id}],
                        "moreDataAvailable": true,
                        "nextCursor": next
                    }))
                }),
            )
        })
        .await;

        let jobs = client_for(base).list_jobs().await.unwrap();
        let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["job-1", "job-2", "job-3"]);
    }

    #[tokio::test]
    async fn test_wrong_credentials_surface_status() {
        let base = spawn_upstream(|_| Router::new().route("/job.list", post(job_list))).await;
        let client = AshbyClient::new("wrong".to_string(), base, Duration::from_secs(5));

        let err = client.list_jobs().await.unwrap_err();
        assert!(matches!(err, AshbyError::Api { status: 401, .. }));
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let base = spawn_upstream(|_| {
            Router::new().route(
                "/job.info",
                post(|| async { Json(json!({"success": false, "errors": ["job_not_found"]})) }),
            )
        })
        .await;

        let err = client_for(base).list_stages("nope").await.unwrap_err();
        assert!(matches!(err, AshbyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_job_without_plan_has_no_stages() {
        let base = spawn_upstream(|_| {
            Router::new().route(
                "/job.info",
                post(|| async { Json(json!({"success": true, "results": {"id": "job-1"}})) }),
            )
        })
        .await;

        let stages = client_for(base).list_stages("job-1").await.unwrap();
        assert!(stages.is_empty());
    }

    #[tokio::test]
    async fn test_list_stages_uses_default_plan() {
        let base = spawn_upstream(|_| {
            Router::new()
                .route(
                    "/job.info",
                    post(|| async {
                        Json(json!({"success": true,
                                    "results": {"id": "job-1", "defaultInterviewPlanId": "plan-1"}}))
                    }),
                )
                .route(
                    "/interviewStage.list",
                    post(|Json(body): Json<Value>| async move {
                        assert_eq!(body["interviewPlanId"], "plan-1");
                        Json(json!({"success": true, "results": [
                            {"id": "stage-1", "title": "Application Review",
                             "type": "ApplicationReview", "orderInInterviewPlan": 1}
                        ]}))
                    }),
                )
        })
        .await;

        let stages = client_for(base).list_stages("job-1").await.unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].title, "Application Review");
        assert_eq!(stages[0].order_in_interview_plan, Some(1));
    }

    #[tokio::test]
    async fn test_list_candidates_passes_job_filter() {
        let base = spawn_upstream(|_| {
            Router::new().route(
                "/application.list",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["jobId"], "job-7");
                    Json(json!({"success": true, "results": [{
                        "id": "app-1",
                        "createdAt": "2024-01-02T00:00:00Z",
                        "candidate": {"id": "cand-1", "name": "Grace Hopper"},
                        "currentInterviewStage": {"id": "s1", "title": "Offer"}
                    }]}))
                }),
            )
        })
        .await;

        let candidates = client_for(base).list_candidates("job-7").await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name.as_deref(), Some("Grace Hopper"));
        assert_eq!(candidates[0].stage.as_deref(), Some("Offer"));
        assert!(candidates[0].resume_file_handle.is_none());
    }

    fn resume_upstream(base_url: String) -> Router {
        Router::new()
            .route(
                "/candidate.info",
                post(|Json(body): Json<Value>| async move {
                    let id = body["id"].as_str().unwrap_or_default().to_string();
                    let results = if id == "cand-1" {
                        json!({"id": id, "resumeFileHandle": {"handle": "h-1", "name": "cv.pdf"}})
                    } else {
                        json!({"id": id})
                    };
                    Json(json!({"success": true, "results": results}))
                }),
            )
            .route(
                "/file.info",
                post(
                    |State(base): State<String>, Json(body): Json<Value>| async move {
                        assert_eq!(body["fileHandle"], "h-1");
                        Json(json!({"success": true,
                                    "results": {"url": format!("{base}/files/h-1")}}))
                    },
                ),
            )
            .route("/files/h-1", get(|| async { b"%PDF-1.4 resume".to_vec() }))
            .with_state(base_url)
    }

    #[tokio::test]
    async fn test_fetch_resume_downloads_signed_url() {
        let base = spawn_upstream(resume_upstream).await;
        let resume = client_for(base).fetch_resume("cand-1").await.unwrap();

        assert_eq!(resume.candidate_id, "cand-1");
        assert_eq!(resume.filename, "cv.pdf");
        assert_eq!(&resume.content[..], b"%PDF-1.4 resume");
    }

    #[tokio::test]
    async fn test_resume_handle_lookup() {
        let base = spawn_upstream(resume_upstream).await;
        let client = client_for(base);

        assert_eq!(
            client.resume_handle("cand-1").await.unwrap().as_deref(),
            Some("h-1")
        );
        assert!(client.resume_handle("cand-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_resume_without_handle_is_not_found() {
        let base = spawn_upstream(resume_upstream).await;
        let err = client_for(base).fetch_resume("cand-2").await.unwrap_err();
        assert!(matches!(err, AshbyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_body_is_an_error() {
        let base = spawn_upstream(|_| Router::new().route("/job.list", post(|| async { "" }))).await;
        let err = client_for(base).list_jobs().await.unwrap_err();
        assert!(matches!(err, AshbyError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let base =
            spawn_upstream(|_| Router::new().route("/job.list", post(|| async { "<html>" }))).await;
        let err = client_for(base).list_jobs().await.unwrap_err();
        assert!(matches!(err, AshbyError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_record_missing_required_field_is_malformed() {
        let base = spawn_upstream(|_| {
            Router::new().route(
                "/job.list",
                post(|| async { Json(json!({"success": true, "results": [{"id": "job-1"}]})) }),
            )
        })
        .await;
        let err = client_for(base).list_jobs().await.unwrap_err();
        assert!(matches!(err, AshbyError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client_for(base).list_jobs().await.unwrap_err();
        assert!(matches!(err, AshbyError::Http(_)));
        assert_eq!(err.status(), None);
    }
}
