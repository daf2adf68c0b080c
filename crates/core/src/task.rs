//! Remote task lifecycle as observed through `GET task_status/{id}`.
//!
//! Tasks are owned and mutated by the compute service. The pipeline only
//! takes snapshots of them until one reports a terminal status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::job::JobResult;

/// Fallback message when the service marks a task failed without saying why.
pub const DEFAULT_TASK_FAILURE: &str = "Task failed";

// ---------------------------------------------------------------------------
// Task identifiers
// ---------------------------------------------------------------------------

/// Server-assigned identifier returned by a job submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap a raw identifier. Returns `None` for an empty or blank string,
    /// which the service never hands out for a real task.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body returned by every job submission endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
    /// Informational text such as `"Processing started"`.
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Coarse lifecycle state of a remote task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Anything that is not terminal. Carries the raw marker the service
    /// reported (`queued`, `processing`, ...).
    Pending(String),
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn from_wire(status: &str) -> Self {
        match status {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            other => Self::Pending(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending(_))
    }
}

/// Raw `task_status` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    /// Absent on some error bodies; treated as an unnamed pending state.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One observation of a remote task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub result: Option<JobResult>,
    pub error: Option<String>,
}

impl TaskSnapshot {
    pub fn pending(marker: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Pending(marker.into()),
            result: None,
            error: None,
        }
    }

    pub fn completed(result: serde_json::Value) -> Self {
        Self {
            status: TaskStatus::Completed,
            result: Some(JobResult::new(result)),
            error: None,
        }
    }

    pub fn failed(error: Option<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            result: None,
            error,
        }
    }

    /// Failure message reported by the service, falling back to
    /// [`DEFAULT_TASK_FAILURE`] when it is missing or blank.
    pub fn failure_message(&self) -> String {
        match self.error.as_deref().map(str::trim) {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ => DEFAULT_TASK_FAILURE.to_string(),
        }
    }
}

impl From<TaskStatusResponse> for TaskSnapshot {
    fn from(wire: TaskStatusResponse) -> Self {
        let status = match wire.status.as_deref() {
            Some(s) => TaskStatus::from_wire(s),
            None => TaskStatus::Pending(String::new()),
        };
        Self {
            status,
            result: wire.result.map(JobResult::new),
            error: wire.error,
        }
    }
}
