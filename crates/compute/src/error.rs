//! Error taxonomy for talking to the remote compute service.

use std::time::Duration;

use lumterior_core::job::JobKind;

/// Errors from submitting or polling remote jobs.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// The service refused to start a job.
    #[error("{}", submission_message(*kind, message.as_deref()))]
    Submission {
        kind: JobKind,
        /// HTTP status code of the refusal.
        status: u16,
        /// Error text reported by the service, if any.
        message: Option<String>,
    },

    /// The service reported a terminal failure for a task.
    #[error("{message}")]
    TaskFailed { task_id: String, message: String },

    /// A submit or status call could not complete, or returned a body
    /// that could not be parsed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A task did not reach a terminal state within the configured limits.
    #[error("Task {task_id} did not finish after {attempts} status checks ({}s)", waited.as_secs())]
    Timeout {
        task_id: String,
        attempts: u32,
        waited: Duration,
    },

    /// The client was configured with unusable values.
    #[error("Invalid compute configuration: {0}")]
    Config(String),
}

impl ComputeError {
    /// Whether a failed status query may be retried under a retry policy.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ComputeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

fn submission_message(kind: JobKind, message: Option<&str>) -> String {
    match message {
        Some(msg) if !msg.trim().is_empty() => {
            format!("{}: {}", kind.failure_headline(), msg.trim())
        }
        _ => kind.failure_headline().to_string(),
    }
}
