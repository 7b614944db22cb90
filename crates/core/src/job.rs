//! Shared job-state model.
//!
//! A [`Job`] is one remote inference request. Its [`JobStatus`] only moves
//! forward: once a terminal status is observed, the job is frozen.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Content type of every artifact returned by the cleanup provider.
pub const ARTIFACT_CONTENT_TYPE: &str = "image/png";

/// How a provider delivers its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// The result arrives in the response to the creation request.
    Synchronous,
    /// Creation returns an id that must be polled for the result.
    Asynchronous,
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl JobStatus {
    /// Whether no further transition can happen from this status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    /// Map a provider-reported status string onto the shared model.
    ///
    /// Unknown statuses are treated as still processing so that the poll
    /// loop keeps going until the attempt budget runs out.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "starting" | "queued" | "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "succeeded" => JobStatus::Succeeded,
            "failed" => JobStatus::Failed,
            "canceled" | "cancelled" => JobStatus::Cancelled,
            "timed_out" => JobStatus::TimedOut,
            _ => JobStatus::Processing,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier and initial status returned when an asynchronous job is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: String,
    pub status: JobStatus,
}

/// Point-in-time view of an asynchronous job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    /// Output image references; absent until the provider supplies them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
}

/// Binary output of a synchronous job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: String,
}

impl Artifact {
    /// Wrap raw image bytes returned by the cleanup provider.
    pub fn png(bytes: Bytes) -> Self {
        Self {
            bytes,
            content_type: ARTIFACT_CONTENT_TYPE.to_string(),
        }
    }
}

/// Client-side record of one asynchronous job.
///
/// The submitted payload stays with the caller; the job only tracks what
/// the provider reported about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: String,
    kind: JobKind,
    status: JobStatus,
    result: Option<Vec<String>>,
    error: Option<String>,
}

impl Job {
    /// Start tracking a job from the handle returned at creation time.
    ///
    /// A handle that is already terminal carries no output, so the record
    /// starts pending and the first poll settles it.
    pub fn from_handle(handle: &JobHandle) -> Self {
        let status = if handle.status.is_terminal() {
            JobStatus::Pending
        } else {
            handle.status
        };
        Self {
            id: handle.id.clone(),
            kind: JobKind::Asynchronous,
            status,
            result: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Output references; only present once the job has succeeded.
    pub fn result(&self) -> Option<&[String]> {
        self.result.as_deref()
    }

    /// Failure cause; only present for failed or timed-out jobs.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply a status observed through polling.
    ///
    /// A snapshot carrying output completes the job regardless of the
    /// reported status. Transitions out of a terminal status are rejected.
    pub fn observe(&mut self, snapshot: &JobSnapshot) -> Result<(), CoreError> {
        if snapshot.id != self.id {
            return Err(CoreError::Validation(format!(
                "Snapshot for job {} applied to job {}",
                snapshot.id, self.id
            )));
        }
        match &snapshot.output {
            Some(output) => self.finish(JobStatus::Succeeded, Some(output.clone()), None),
            None if snapshot.status == JobStatus::Succeeded => {
                // Succeeded without output yet: keep polling.
                self.transition(JobStatus::Processing)
            }
            None => self.transition(snapshot.status),
        }
    }

    /// Move the job into a terminal status decided on the client side
    /// (cancellation, timeout, gateway failure).
    pub fn settle(&mut self, status: JobStatus, error: Option<String>) -> Result<(), CoreError> {
        if !status.is_terminal() {
            return Err(CoreError::Validation(format!(
                "Cannot settle job {} with non-terminal status {status}",
                self.id
            )));
        }
        let error = match status {
            JobStatus::Failed | JobStatus::TimedOut => error,
            _ => None,
        };
        self.finish(status, None, error)
    }

    fn transition(&mut self, status: JobStatus) -> Result<(), CoreError> {
        self.ensure_open(status)?;
        self.status = status;
        Ok(())
    }

    fn finish(
        &mut self,
        status: JobStatus,
        result: Option<Vec<String>>,
        error: Option<String>,
    ) -> Result<(), CoreError> {
        self.ensure_open(status)?;
        self.status = status;
        self.result = result;
        self.error = error;
        Ok(())
    }

    fn ensure_open(&self, next: JobStatus) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(CoreError::Validation(format!(
                "Job {} is already {} and cannot become {next}",
                self.id, self.status
            )));
        }
        Ok(())
    }
}
