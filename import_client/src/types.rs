use std::fmt;

use bytes::Bytes;
use progress_tracking::ProcessingSnapshot;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ImportClientError, ValidationError};

/// A file selected for import: its name and full content.
///
/// Cloning is cheap; the content is reference counted.
#[derive(Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub content: Bytes,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for ImportFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportFile")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Local preconditions a file must meet before it is submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Required file name suffix, compared case-insensitively (e.g. ".csv").
    pub allowed_extension: String,
    pub max_upload_size: u64,
}

impl UploadPolicy {
    pub fn from_config(config: &importer_config::ImporterConfig) -> Self {
        Self {
            allowed_extension: config.upload.allowed_extension.clone(),
            max_upload_size: config.upload.max_upload_size,
        }
    }

    pub fn validate(&self, file: &ImportFile) -> std::result::Result<(), ValidationError> {
        if file.name.trim().is_empty() {
            return Err(ValidationError::EmptyFileName);
        }

        let name = file.name.to_ascii_lowercase();
        let extension = self.allowed_extension.to_ascii_lowercase();
        if !name.ends_with(&extension) {
            return Err(ValidationError::InvalidFileType {
                file_name: file.name.clone(),
                expected: self.allowed_extension.clone(),
            });
        }

        if file.len() > self.max_upload_size {
            return Err(ValidationError::FileTooLarge {
                file_name: file.name.clone(),
                size: file.len(),
                limit: self.max_upload_size,
            });
        }

        Ok(())
    }
}

/// Opaque identifier of one asynchronous processing job, assigned by the server.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// Returns `None` for an empty or whitespace-only identifier.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a successful upload hands back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    pub job_id: JobId,
    pub message: Option<String>,
}

/// Success body of the submission endpoint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default, alias = "task_id")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Failure body of the submission endpoint.  `detail` is usually a string but validation
/// failures may carry a structured value.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorResponse {
    pub fn detail_message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Processing state reported by the server.  Only `SUCCESS` and `FAILURE` are terminal;
/// any other marker (`PENDING`, `PROGRESS`, custom states) means the job is still running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    InProgress(String),
    Success,
    Failure,
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::InProgress(String::new())
    }
}

impl From<String> for TaskState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SUCCESS" => TaskState::Success,
            "FAILURE" => TaskState::Failure,
            _ => TaskState::InProgress(s),
        }
    }
}

impl<'de> Deserialize<'de> for TaskState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.map(TaskState::from).unwrap_or_default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// One decoded message from the progress stream.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProgressEvent {
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub total: u64,
    /// Server-side failure description on `FAILURE` events.
    #[serde(default)]
    pub error: Option<String>,
    /// Result summary on `SUCCESS` events, e.g. processed/total counts.
    #[serde(default)]
    pub result: Option<Value>,
}

impl ProgressEvent {
    pub fn from_json(data: &str) -> crate::error::Result<Self> {
        serde_json::from_str(data).map_err(|e| ImportClientError::SubscriptionDecode(e.to_string()))
    }

    pub fn terminal(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            TaskState::Success => Some(Outcome::Success),
            TaskState::Failure => Some(Outcome::Failure),
            TaskState::InProgress(_) => None,
        }
    }

    pub fn snapshot(&self) -> ProcessingSnapshot {
        let percent = if self.percent.is_finite() && self.percent > 0. {
            self.percent.floor() as u64
        } else {
            0
        };
        ProcessingSnapshot::new(percent, self.status.clone(), self.current, self.total)
    }

    /// Why the job failed: the server's error text, else its status line, else a generic cause.
    pub fn failure_cause(&self) -> String {
        [self.error.as_deref(), Some(self.status.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("Processing failed")
            .to_owned()
    }
}
