//! Result handoff: persist a finished run's results for the next screen and
//! say where to go next.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use lumterior_core::job::JobResult;

use crate::error::PipelineError;

/// File the variant results are written to inside the handoff directory.
pub const RESULTS_FILE: &str = "processedImages.json";

/// Where the caller should continue once results are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Continuation {
    /// Route of the location-selection screen, e.g. `/selectloc?clusterId=2`.
    pub path: String,
}

impl Continuation {
    pub fn select_location(cluster_id: u32) -> Self {
        Self {
            path: format!("/selectloc?clusterId={cluster_id}"),
        }
    }
}

/// Receives the results of a successful run.
#[async_trait]
pub trait ResultHandoff: Send + Sync {
    async fn hand_off(
        &self,
        cluster_id: u32,
        results: &[JobResult],
    ) -> Result<Continuation, PipelineError>;
}

/// Writes results as JSON into a transient directory, replacing any
/// previous run's file.
pub struct JsonFileHandoff {
    dir: PathBuf,
}

impl JsonFileHandoff {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `HANDOFF_DIR`, falling back to `lumterior` under the system temp dir.
    pub fn from_env() -> Self {
        let dir = std::env::var("HANDOFF_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("lumterior"));
        Self::new(dir)
    }

    pub fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }
}

#[async_trait]
impl ResultHandoff for JsonFileHandoff {
    async fn hand_off(
        &self,
        cluster_id: u32,
        results: &[JobResult],
    ) -> Result<Continuation, PipelineError> {
        let body = serde_json::to_vec_pretty(results)
            .map_err(|e| PipelineError::Handoff(format!("Failed to encode results: {e}")))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            PipelineError::Handoff(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        let path = self.results_path();
        tokio::fs::write(&path, body).await.map_err(|e| {
            PipelineError::Handoff(format!("Failed to write {}: {e}", path.display()))
        })?;

        let next = Continuation::select_location(cluster_id);
        tracing::info!(
            path = %path.display(),
            results = results.len(),
            next = %next.path,
            "Results handed off",
        );
        Ok(next)
    }
}
