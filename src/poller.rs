//! Export job lifecycle: submit, poll, and resolve to a downloadable file.
//!
//! The status endpoint answers in one of two shapes. A `303 See Other` with a
//! `location` header means the file is ready at that location. Anything else
//! carries a JSON:API document whose `data.attributes.status` says where the
//! job is. Every poll checks for the redirect first.

use crate::cancel::CancelToken;
use crate::client::TransifexClient;
use crate::error::{Result, SyncError};
use crate::model::{JobId, JobStatus, Language, PollOutcome, Project, ResourceModule};
use reqwest::{header::LOCATION, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const DOWNLOADS_PATH: &str = "resource_translations_async_downloads";

/// Poll bound and backoff for a single export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of status requests (including the first one)
    pub max_attempts: u32,
    /// Fixed wait between two status requests
    pub interval: Duration,
}

impl PollConfig {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for PollConfig {
    /// 10 attempts, 500ms apart
    fn default() -> Self {
        Self::new(10, Duration::from_millis(500))
    }
}

#[derive(Debug, Deserialize)]
struct CreatedJob {
    data: CreatedJobData,
}

#[derive(Debug, Deserialize)]
struct CreatedJobData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobDocument {
    data: JobData,
}

#[derive(Debug, Deserialize)]
struct JobData {
    attributes: JobAttributes,
}

#[derive(Debug, Deserialize)]
struct JobAttributes {
    status: JobStatus,
}

/// Build the JSON:API body that asks for a plain-text export.
fn export_request(
    project: &Project,
    resource: &ResourceModule,
    language: &Language,
) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "attributes": {
                "callback_url": null,
                "content_encoding": "text",
                "file_type": "default",
                "mode": "default",
                "pseudo": false
            },
            "relationships": {
                "language": {
                    "data": { "id": language.id, "type": "languages" }
                },
                "resource": {
                    "data": { "id": resource.remote_id(project), "type": "resources" }
                }
            },
            "type": DOWNLOADS_PATH
        }
    })
}

/// Turn one status response into a [`PollOutcome`].
///
/// `request_url` resolves relative `location` headers.
fn classify(
    status: StatusCode,
    location: Option<&str>,
    body: String,
    request_url: &Url,
) -> std::result::Result<PollOutcome, String> {
    if status.is_redirection() {
        if let Some(location) = location {
            return request_url
                .join(location)
                .map(PollOutcome::Redirect)
                .map_err(|e| format!("invalid location {:?}: {}", location, e));
        }
    }

    match serde_json::from_str::<JobDocument>(&body) {
        Ok(doc) => Ok(PollOutcome::Status {
            status: doc.data.attributes.status,
            body,
        }),
        Err(e) => Err(format!("unexpected response (HTTP {}): {}: {}", status, e, body)),
    }
}

/// Drives export jobs for one project.
pub struct JobPoller<'a> {
    client: &'a TransifexClient,
    project: &'a Project,
    config: PollConfig,
    cancel: CancelToken,
}

impl<'a> JobPoller<'a> {
    pub fn new(
        client: &'a TransifexClient,
        project: &'a Project,
        config: PollConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            client,
            project,
            config,
            cancel,
        }
    }

    /// Create an export job for one resource in one language.
    pub async fn submit(&self, resource: &ResourceModule, language: &Language) -> Result<JobId> {
        let submission_error = |reason: String| SyncError::Submission {
            resource: resource.slug.clone(),
            language: language.code.clone(),
            reason,
        };

        let url = self
            .client
            .endpoint(DOWNLOADS_PATH)
            .map_err(|e| submission_error(e.to_string()))?;
        let body = export_request(self.project, resource, language);

        let response = self
            .client
            .post_json_api(url, &body)
            .send()
            .await
            .map_err(|e| submission_error(format!("request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| submission_error(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(submission_error(format!("HTTP {}: {}", status, text)));
        }

        let created: CreatedJob = serde_json::from_str(&text)
            .map_err(|e| submission_error(format!("invalid response: {}: {}", e, text)))?;

        debug!(
            "Submitted export job {} for {} ({})",
            created.data.id, resource.slug, language.code
        );
        Ok(JobId::new(created.data.id))
    }

    /// Issue a single status request for a job.
    pub async fn check(&self, job: &JobId) -> Result<PollOutcome> {
        let poll_error = |reason: String| SyncError::Poll {
            job_id: job.to_string(),
            reason,
        };

        let url = self
            .client
            .endpoint(&format!("{}/{}", DOWNLOADS_PATH, job))
            .map_err(|e| poll_error(e.to_string()))?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| poll_error(format!("request failed: {}", e)))?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| poll_error(format!("failed to read response: {}", e)))?;

        classify(status, location.as_deref(), body, &url).map_err(poll_error)
    }

    /// Poll a job until the service redirects to its file.
    ///
    /// Fails with `JobFailed` as soon as the job reports `failed`, with
    /// `JobTimeout` once the attempt bound is used up, and with `Cancelled`
    /// if cancellation arrives while waiting between polls.
    pub async fn resolve(&self, job: &JobId) -> Result<Url> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let mut last: Option<JobStatus> = None;
        for attempt in 1..=self.config.max_attempts {
            match self.check(job).await? {
                PollOutcome::Redirect(location) => {
                    debug!("Export job {} ready after {} checks", job, attempt);
                    return Ok(location);
                }
                PollOutcome::Status {
                    status: JobStatus::Failed,
                    body,
                } => {
                    return Err(SyncError::JobFailed {
                        job_id: job.to_string(),
                        body,
                    });
                }
                PollOutcome::Status { status, .. } => {
                    if let Some(previous) = last.filter(|p| p.stage() > status.stage()) {
                        warn!(
                            "Export job {} went back from {:?} to {:?}",
                            job, previous, status
                        );
                    }
                    last = Some(status);

                    if attempt == self.config.max_attempts {
                        break;
                    }
                    debug!(
                        "Export job {} is {:?}, check {}/{} again in {:?}",
                        job, status, attempt, self.config.max_attempts, self.config.interval
                    );
                    tokio::select! {
                        _ = sleep(self.config.interval) => {}
                        _ = self.cancel.cancelled() => {
                            warn!("Cancellation received while waiting for export job {}", job);
                            return Err(SyncError::Cancelled);
                        }
                    }
                }
            }
        }

        Err(SyncError::JobTimeout {
            job_id: job.to_string(),
            attempts: self.config.max_attempts,
        })
    }

    /// Submit an export and wait for its file location.
    pub async fn export(&self, resource: &ResourceModule, language: &Language) -> Result<Url> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let job = self.submit(resource, language).await?;
        self.resolve(&job).await
    }
}
