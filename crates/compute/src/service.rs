//! The seam between the orchestrator and the remote compute service.

use std::sync::Arc;

use async_trait::async_trait;
use lumterior_core::job::JobRequest;
use lumterior_core::task::{TaskId, TaskSnapshot};

use crate::error::ComputeError;

/// Operations the remote compute service exposes.
///
/// [`ComputeApi`](crate::api::ComputeApi) implements this over HTTP; tests
/// substitute scripted in-memory services.
#[async_trait]
pub trait ComputeService: Send + Sync {
    /// Start a job and return its task identifier without waiting for it.
    async fn submit(&self, request: &JobRequest) -> Result<TaskId, ComputeError>;

    /// Take one snapshot of a task's status.
    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ComputeError>;
}

#[async_trait]
impl<S: ComputeService + ?Sized> ComputeService for Arc<S> {
    async fn submit(&self, request: &JobRequest) -> Result<TaskId, ComputeError> {
        (**self).submit(request).await
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ComputeError> {
        (**self).task_status(task_id).await
    }
}
