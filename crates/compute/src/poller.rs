//! Fixed-interval task polling.
//!
//! [`TaskPoller::poll`] queries a task's status once per interval until the
//! service reports `completed` or `failed`. The interval timer lives inside
//! the returned future, so it is dropped on every exit path: resolution,
//! task failure, transport failure, timeout, or the caller dropping the
//! future.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use lumterior_core::job::JobResult;
use lumterior_core::task::{TaskId, TaskStatus};

use crate::config::{ComputeConfig, PollLimits, DEFAULT_POLL_INTERVAL};
use crate::error::ComputeError;
use crate::retry::RetryPolicy;
use crate::service::ComputeService;

/// Polls remote tasks to completion.
#[derive(Debug, Clone)]
pub struct TaskPoller {
    interval: Duration,
    limits: PollLimits,
    retry: RetryPolicy,
}

impl TaskPoller {
    /// A poller with the given interval, default limits and fail-fast
    /// transport handling.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            limits: PollLimits::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &ComputeConfig) -> Self {
        Self {
            interval: config.poll_interval,
            limits: config.poll_limits,
            retry: config.retry.clone(),
        }
    }

    pub fn with_limits(mut self, limits: PollLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Wait for `task_id` to reach a terminal state.
    ///
    /// The first status query is issued one interval after the call, then
    /// once per interval. Resolves with the task's result payload on
    /// `completed`; rejects with [`ComputeError::TaskFailed`] on `failed`,
    /// with the transport error once the retry policy is exhausted, or with
    /// [`ComputeError::Timeout`] when a poll limit is hit.
    pub async fn poll<S>(&self, service: &S, task_id: &TaskId) -> Result<JobResult, ComputeError>
    where
        S: ComputeService + ?Sized,
    {
        let started = Instant::now();
        let deadline = self.limits.deadline.map(|d| started + d);

        let mut ticker = tokio::time::interval_at(started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts = 0u32;
        let mut consecutive_failures = 0u32;

        loop {
            match deadline {
                Some(at) => {
                    if tokio::time::timeout_at(at, ticker.tick()).await.is_err() {
                        return Err(self.timed_out(task_id, attempts, started));
                    }
                }
                None => {
                    ticker.tick().await;
                }
            }

            // A retry backoff can leave the next tick already due.
            if deadline.is_some_and(|at| Instant::now() >= at) {
                return Err(self.timed_out(task_id, attempts, started));
            }

            attempts += 1;

            match service.task_status(task_id).await {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    match &snapshot.status {
                        TaskStatus::Completed => {
                            tracing::info!(task_id = %task_id, attempts, "Task completed");
                            return Ok(snapshot.result.unwrap_or_default());
                        }
                        TaskStatus::Failed => {
                            let message = snapshot.failure_message();
                            tracing::warn!(task_id = %task_id, attempts, error = %message, "Task failed");
                            return Err(ComputeError::TaskFailed {
                                task_id: task_id.to_string(),
                                message,
                            });
                        }
                        TaskStatus::Pending(marker) => {
                            tracing::debug!(task_id = %task_id, attempts, status = %marker, "Task pending");
                        }
                    }
                }
                Err(e) if e.is_transport() && self.retry.allows_retry(consecutive_failures) => {
                    consecutive_failures += 1;
                    let delay = self.retry.delay_for(consecutive_failures);
                    tracing::warn!(
                        task_id = %task_id,
                        attempt = consecutive_failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Status query failed, retrying",
                    );
                    let wake = Instant::now() + delay;
                    tokio::time::sleep_until(deadline.map_or(wake, |at| wake.min(at))).await;
                }
                Err(e) => {
                    tracing::error!(task_id = %task_id, attempts, error = %e, "Status query failed");
                    return Err(e);
                }
            }

            if self.limits.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(self.timed_out(task_id, attempts, started));
            }
        }
    }

    fn timed_out(&self, task_id: &TaskId, attempts: u32, started: Instant) -> ComputeError {
        let waited = started.elapsed();
        tracing::warn!(
            task_id = %task_id,
            attempts,
            waited_ms = waited.as_millis() as u64,
            "Gave up polling task",
        );
        ComputeError::Timeout {
            task_id: task_id.to_string(),
            attempts,
            waited,
        }
    }
}

impl Default for TaskPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}
