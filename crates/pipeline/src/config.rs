use std::str::FromStr;

use lumterior_core::job::{DEFAULT_GUIDANCE_SCALE, DEFAULT_SEED};
use lumterior_core::CoreError;

use crate::stage::{Settle, StagePolicy};

/// Per-run settings for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Concurrency class of variant-generation jobs.
    pub variant_stage: StagePolicy,
    /// Concurrency class of mask-generation jobs.
    pub mask_stage: StagePolicy,
    pub seed: u32,
    pub scale: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            variant_stage: StagePolicy::SEQUENTIAL,
            mask_stage: StagePolicy::FAN_OUT,
            seed: DEFAULT_SEED,
            scale: DEFAULT_GUIDANCE_SCALE,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `VARIANT_MAX_CONCURRENCY` | `1`     |
    /// | `MASK_MAX_CONCURRENCY`    | `0` (all at once) |
    /// | `GENERATION_SEED`         | `321`   |
    /// | `GENERATION_SCALE`        | `20`    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let variant_width = parse_var(&lookup, "VARIANT_MAX_CONCURRENCY", 1usize)?;
        let mask_width = parse_var(&lookup, "MASK_MAX_CONCURRENCY", 0usize)?;

        Ok(Self {
            variant_stage: StagePolicy {
                max_concurrency: variant_width,
                settle: Settle::FailFast,
            },
            mask_stage: StagePolicy {
                max_concurrency: mask_width,
                settle: Settle::AwaitAll,
            },
            seed: parse_var(&lookup, "GENERATION_SEED", defaults.seed)?,
            scale: parse_var(&lookup, "GENERATION_SCALE", defaults.scale)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{name} has invalid value '{raw}'"))),
        None => Ok(default),
    }
}
