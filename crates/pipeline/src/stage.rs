//! Concurrency classes for pipeline stages.
//!
//! Every stage runs its jobs through [`run_stage`]; only the [`StagePolicy`]
//! differs. A width of one gives strict sequencing (job `k+1` is not started
//! until job `k` settles), a width of zero runs every job at once. Results
//! always come back in input order.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// How a stage reacts to a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Stop at the first failure; jobs not yet started never start.
    FailFast,
    /// Let every job settle, then surface the first failure by position.
    AwaitAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePolicy {
    /// Jobs allowed in flight at once. `0` means all of them.
    pub max_concurrency: usize,
    pub settle: Settle,
}

impl StagePolicy {
    /// One job at a time, abort on first failure.
    pub const SEQUENTIAL: Self = Self {
        max_concurrency: 1,
        settle: Settle::FailFast,
    };

    /// All jobs at once, wait for every outcome.
    pub const FAN_OUT: Self = Self {
        max_concurrency: 0,
        settle: Settle::AwaitAll,
    };

    /// Effective width for a stage of `jobs` jobs.
    pub fn width(&self, jobs: usize) -> usize {
        match self.max_concurrency {
            0 => jobs.max(1),
            n => n.min(jobs.max(1)),
        }
    }
}

/// Run `job` over `inputs` under `policy`, returning outputs in input order.
///
/// `job` receives each input with its zero-based position.
pub async fn run_stage<I, T, E, F, Fut>(
    policy: StagePolicy,
    inputs: Vec<I>,
    mut job: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(usize, I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let total = inputs.len();
    let mut outcomes = stream::iter(inputs.into_iter().enumerate())
        .map(|(index, input)| job(index, input))
        .buffered(policy.width(total));

    match policy.settle {
        Settle::FailFast => {
            let mut results = Vec::with_capacity(total);
            while let Some(outcome) = outcomes.next().await {
                results.push(outcome?);
            }
            Ok(results)
        }
        Settle::AwaitAll => {
            let settled: Vec<Result<T, E>> = outcomes.collect().await;
            settled.into_iter().collect()
        }
    }
}
