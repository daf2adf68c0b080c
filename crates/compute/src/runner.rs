//! Submit-then-poll composition for a single job.

use lumterior_core::job::{JobRequest, JobResult};
use lumterior_core::task::TaskId;

use crate::error::ComputeError;
use crate::poller::TaskPoller;
use crate::service::ComputeService;

/// Runs jobs against one compute service: submit, then poll to a terminal
/// state.
#[derive(Debug, Clone)]
pub struct JobRunner<S> {
    service: S,
    poller: TaskPoller,
}

impl<S: ComputeService> JobRunner<S> {
    pub fn new(service: S, poller: TaskPoller) -> Self {
        Self { service, poller }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submit `request` without waiting for it. Never retried.
    pub async fn submit(&self, request: &JobRequest) -> Result<TaskId, ComputeError> {
        let kind = request.kind();
        match self.service.submit(request).await {
            Ok(task_id) => {
                tracing::info!(kind = %kind, task_id = %task_id, "Job submitted");
                Ok(task_id)
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Job submission failed");
                Err(e)
            }
        }
    }

    /// Submit `request` and wait for its result.
    pub async fn run(&self, request: &JobRequest) -> Result<JobResult, ComputeError> {
        let task_id = self.submit(request).await?;
        self.poller.poll(&self.service, &task_id).await
    }
}
