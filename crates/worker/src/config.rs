//! Worker settings not owned by a library crate.

use std::path::PathBuf;

use anyhow::{bail, Context};

use lumterior_core::reference::{default_references, parse_references, ReferenceAsset};

const DEFAULT_LATEST_IMAGE_PATH: &str = "latest-image.json";

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Exported latest-image record.
    pub latest_image_path: PathBuf,
    /// Marker the run targets.
    pub cluster_id: u32,
    pub references: Vec<ReferenceAsset>,
    /// Whether a recommendation service is configured.
    pub recommend: bool,
}

impl WorkerConfig {
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `LATEST_IMAGE_PATH`   | `latest-image.json` |
    /// | `MARKER_CLUSTER_ID`   | required |
    /// | `REFERENCE_URLS`      | built-in lamp set (comma-separated) |
    /// | `RECOMMENDER_API_URL` | unset (recommendation skipped) |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let latest_image_path = set("LATEST_IMAGE_PATH")
            .unwrap_or_else(|| DEFAULT_LATEST_IMAGE_PATH.to_string())
            .into();

        let cluster_id = set("MARKER_CLUSTER_ID")
            .context("MARKER_CLUSTER_ID must be set")?
            .trim()
            .parse()
            .context("MARKER_CLUSTER_ID must be a non-negative integer")?;

        let references = match set("REFERENCE_URLS") {
            Some(raw) => parse_references(
                raw.split(',').map(str::trim).filter(|url| !url.is_empty()),
            )?,
            None => default_references(),
        };
        if references.is_empty() {
            bail!("REFERENCE_URLS lists no reference assets");
        }

        Ok(Self {
            latest_image_path,
            cluster_id,
            references,
            recommend: set("RECOMMENDER_API_URL").is_some(),
        })
    }
}
