#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::Instant;

use lumterior_compute::{ComputeError, ComputeService, JobRunner, PollLimits, TaskPoller};
use lumterior_core::job::{JobKind, JobRequest};
use lumterior_core::progress::ProgressReporter;
use lumterior_core::record::{MarkerSelection, SourceImage};
use lumterior_core::reference::ReferenceAsset;
use lumterior_core::task::{TaskId, TaskSnapshot};
use lumterior_pipeline::{PipelineConfig, PipelineOrchestrator};

pub const INTERVAL: Duration = Duration::from_secs(3);

/// How a scripted job ends.
#[derive(Debug, Clone)]
pub enum Outcome {
    Complete(Value),
    Fail(Option<String>),
}

/// Script for one job, keyed by kind and reference URL.
#[derive(Debug, Clone)]
pub enum Plan {
    /// Accept the job; the status query number `ticks` reports `outcome`.
    Run { ticks: u32, outcome: Outcome },
    /// Refuse the submission with this HTTP status.
    Refuse(u16),
}

impl Plan {
    pub fn completes_after(ticks: u32, result: Value) -> Self {
        Self::Run {
            ticks,
            outcome: Outcome::Complete(result),
        }
    }

    pub fn fails_after(ticks: u32, message: &str) -> Self {
        Self::Run {
            ticks,
            outcome: Outcome::Fail(Some(message.to_string())),
        }
    }
}

/// Something the scripted service observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Submitted {
        kind: JobKind,
        reference: String,
        at: Instant,
    },
    Settled {
        kind: JobKind,
        reference: String,
        at: Instant,
    },
}

struct Task {
    kind: JobKind,
    reference: String,
    ticks: u32,
    outcome: Outcome,
    queries: u32,
}

/// In-memory compute service that replays per-job scripts.
///
/// Jobs without a script complete after one status query. Variant results
/// default to `{"processed_image_path": "/out/<reference>"}`.
#[derive(Default)]
pub struct ScriptedCompute {
    plans: Mutex<HashMap<(JobKind, String), Plan>>,
    tasks: Mutex<HashMap<String, Task>>,
    events: Mutex<Vec<Event>>,
}

impl ScriptedCompute {
    pub fn plan(&self, kind: JobKind, reference: &str, plan: Plan) {
        self.plans
            .lock()
            .unwrap()
            .insert((kind, reference.to_string()), plan);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// References of submitted jobs of `kind`, in submission order.
    pub fn submitted(&self, kind: JobKind) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Submitted { kind: k, reference, .. } if k == kind => Some(reference),
                _ => None,
            })
            .collect()
    }

    pub fn submitted_at(&self, kind: JobKind, reference: &str) -> Option<Instant> {
        self.events().into_iter().find_map(|e| match e {
            Event::Submitted { kind: k, reference: r, at } if k == kind && r == reference => {
                Some(at)
            }
            _ => None,
        })
    }

    pub fn settled_at(&self, kind: JobKind, reference: &str) -> Option<Instant> {
        self.events().into_iter().find_map(|e| match e {
            Event::Settled { kind: k, reference: r, at } if k == kind && r == reference => {
                Some(at)
            }
            _ => None,
        })
    }

    fn default_plan(kind: JobKind, reference: &str) -> Plan {
        match kind {
            JobKind::VariantGeneration => {
                Plan::completes_after(1, json!({ "processed_image_path": format!("/out/{reference}") }))
            }
            _ => Plan::completes_after(1, json!({ "mask_path": format!("/masks/{reference}") })),
        }
    }
}

#[async_trait]
impl ComputeService for ScriptedCompute {
    async fn submit(&self, request: &JobRequest) -> Result<TaskId, ComputeError> {
        let kind = request.kind();
        let reference = request.reference().unwrap_or_default().to_string();

        self.events.lock().unwrap().push(Event::Submitted {
            kind,
            reference: reference.clone(),
            at: Instant::now(),
        });

        let plan = self
            .plans
            .lock()
            .unwrap()
            .get(&(kind, reference.clone()))
            .cloned()
            .unwrap_or_else(|| Self::default_plan(kind, &reference));

        match plan {
            Plan::Refuse(status) => Err(ComputeError::Submission {
                kind,
                status,
                message: None,
            }),
            Plan::Run { ticks, outcome } => {
                let mut tasks = self.tasks.lock().unwrap();
                let task_id = format!("task-{}", tasks.len() + 1);
                tasks.insert(
                    task_id.clone(),
                    Task {
                        kind,
                        reference,
                        ticks,
                        outcome,
                        queries: 0,
                    },
                );
                Ok(TaskId::new(task_id).unwrap())
            }
        }
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ComputeError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(task_id.as_str())
            .ok_or_else(|| ComputeError::Transport("Task not found".into()))?;

        task.queries += 1;
        if task.queries < task.ticks {
            return Ok(TaskSnapshot::pending("processing"));
        }

        self.events.lock().unwrap().push(Event::Settled {
            kind: task.kind,
            reference: task.reference.clone(),
            at: Instant::now(),
        });

        Ok(match &task.outcome {
            Outcome::Complete(result) => TaskSnapshot::completed(result.clone()),
            Outcome::Fail(message) => TaskSnapshot::failed(message.clone()),
        })
    }
}

/// Records every label it receives, plus how often it was cleared.
#[derive(Default)]
pub struct RecordingReporter {
    pub labels: Mutex<Vec<String>>,
    pub clears: Mutex<u32>,
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, label: &str) {
        self.labels.lock().unwrap().push(label.to_string());
    }

    fn clear(&self) {
        *self.clears.lock().unwrap() += 1;
    }
}

pub fn orchestrator(
    service: Arc<ScriptedCompute>,
    config: PipelineConfig,
) -> PipelineOrchestrator<Arc<ScriptedCompute>> {
    let poller = TaskPoller::new(INTERVAL).with_limits(PollLimits::UNBOUNDED);
    PipelineOrchestrator::new(JobRunner::new(service, poller), config)
}

pub fn source() -> SourceImage {
    SourceImage::new("room.jpg", "https://bucket.s3.region.amazonaws.com/room.jpg")
}

pub fn selection() -> MarkerSelection {
    MarkerSelection {
        cluster_id: 2,
        mask_url: "https://bucket.s3.region.amazonaws.com/room.jpg-masks/mask_cluster_2.png"
            .into(),
    }
}

/// Reference assets named `A`, `B`, ... whose URL is the name itself.
pub fn references(names: &[&str]) -> Vec<ReferenceAsset> {
    names
        .iter()
        .map(|name| ReferenceAsset {
            url: name.to_string(),
            label: name.to_string(),
        })
        .collect()
}
