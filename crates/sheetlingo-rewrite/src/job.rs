//! Client for the asynchronous whole-file translation service
//!
//! The service accepts a workbook upload, runs the translation in the
//! background and exposes the result for download:
//!
//! - `POST {base}/translate-excel` (multipart) → `{"job_id": ..}`
//! - `GET {base}/translation-status/{job_id}` → status document
//! - `GET {base}/download/{file_id}/{filename}` → workbook bytes

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use crate::direction::Direction;
use crate::error::{RewriteError, RewriteResult};
use crate::http;

/// Job client settings
#[derive(Debug, Clone)]
pub struct JobClientConfig {
    /// Service root, e.g. `http://localhost:5001`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Fixed delay between status polls
    pub poll_interval: Duration,
    /// Give up waiting after this long
    pub max_wait: Duration,
}

impl JobClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl Default for JobClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(600),
        }
    }
}

/// What to ask the service to do with an uploaded workbook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRequest {
    pub direction: Direction,
    pub preserve_english: bool,
    /// Keep original sheets and add translated copies
    pub add_new_sheet: bool,
    pub exclude_sheets: Vec<String>,
    /// Qualified references, `Sheet1!A1`
    pub exclude_cells: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

/// Identifier returned by a successful submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
}

/// Where a finished job's output can be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
    pub file_id: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running { progress: u8, message: String },
    Completed(JobOutput),
    Failed { error: String },
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    download_filename: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl StatusResponse {
    fn into_status(self) -> RewriteResult<JobStatus> {
        match self.status.as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running {
                progress: self.progress.unwrap_or(0.0).clamp(0.0, 100.0) as u8,
                message: self.message.unwrap_or_default(),
            }),
            "completed" => match (self.file_id, self.download_filename) {
                (Some(file_id), Some(filename)) => {
                    Ok(JobStatus::Completed(JobOutput { file_id, filename }))
                }
                _ => Err(RewriteError::Parse(
                    "completed job without file_id/download_filename".into(),
                )),
            },
            "error" | "failed" => Ok(JobStatus::Failed {
                error: self.error.unwrap_or_else(|| "unknown error".into()),
            }),
            other => Err(RewriteError::Parse(format!("unknown job status '{}'", other))),
        }
    }
}

/// Blocking client for the translation job service
pub struct JobClient {
    http: Client,
    base: Url,
    poll_interval: Duration,
    max_wait: Duration,
}

impl JobClient {
    pub fn new(config: JobClientConfig) -> RewriteResult<Self> {
        let base = Url::parse(http::trim_base(&config.base_url))
            .map_err(|e| RewriteError::Parse(format!("bad job server url: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(RewriteError::Parse(format!(
                "bad job server url: {}",
                config.base_url
            )));
        }
        Ok(Self {
            http: http::client(config.timeout)?,
            base,
            poll_interval: config.poll_interval,
            max_wait: config.max_wait,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Upload a workbook and start a job
    pub fn submit(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        request: &JobRequest,
    ) -> RewriteResult<JobHandle> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("direction", request.direction.code())
            .text("preserve_english", request.preserve_english.to_string())
            .text("add_new_sheet", request.add_new_sheet.to_string())
            .text("exclude_sheets", request.exclude_sheets.join(","))
            .text("exclude_cells", request.exclude_cells.join(","))
            .text("exclude_patterns", request.exclude_patterns.join(","));

        let url = self.url(&["translate-excel"]);
        let response = http::send(self.http.post(url).multipart(form))?;
        let parsed: SubmitResponse = response
            .json()
            .map_err(|e| RewriteError::Parse(e.to_string()))?;

        match (parsed.job_id, parsed.error) {
            (Some(id), _) => {
                log::debug!("Submitted {} as job {}", file_name, id);
                Ok(JobHandle { id })
            }
            (None, Some(error)) => Err(RewriteError::JobFailed(error)),
            (None, None) => Err(RewriteError::Parse("submit response without job_id".into())),
        }
    }

    /// One status query
    pub fn poll(&self, handle: &JobHandle) -> RewriteResult<JobStatus> {
        let url = self.url(&["translation-status", &handle.id]);
        let response = http::send(self.http.get(url))?;
        let parsed: StatusResponse = response
            .json()
            .map_err(|e| RewriteError::Parse(e.to_string()))?;
        parsed.into_status()
    }

    /// Fetch the finished workbook
    pub fn download(&self, output: &JobOutput) -> RewriteResult<Vec<u8>> {
        let url = self.url(&["download", &output.file_id, &output.filename]);
        let response = http::send(self.http.get(url))?;
        let bytes = response
            .bytes()
            .map_err(|e| RewriteError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Poll at the fixed interval until the job finishes.
    ///
    /// The first failed poll ends the wait with that error; it is not
    /// retried.
    pub fn wait<F>(&self, handle: &JobHandle, mut on_progress: F) -> RewriteResult<JobOutput>
    where
        F: FnMut(u8, &str),
    {
        let start = Instant::now();
        loop {
            match self.poll(handle)? {
                JobStatus::Queued => on_progress(0, "queued"),
                JobStatus::Running { progress, message } => on_progress(progress, &message),
                JobStatus::Completed(output) => {
                    on_progress(100, "completed");
                    return Ok(output);
                }
                JobStatus::Failed { error } => return Err(RewriteError::JobFailed(error)),
            }

            if start.elapsed() >= self.max_wait {
                return Err(RewriteError::JobFailed(format!(
                    "job {} did not finish within {}s",
                    handle.id,
                    self.max_wait.as_secs()
                )));
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl std::fmt::Debug for JobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobClient")
            .field("base", &self.base.as_str())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
