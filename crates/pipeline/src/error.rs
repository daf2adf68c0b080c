use lumterior_compute::ComputeError;
use lumterior_core::CoreError;

/// Pipeline stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Variant,
    Mask,
    Recommendation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Variant => "variant generation",
            Self::Mask => "mask generation",
            Self::Recommendation => "location recommendation",
        })
    }
}

/// Errors that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Required run inputs were missing or malformed.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// A job was refused, failed remotely, or could not be tracked. Displays
    /// the underlying message unchanged so callers can show it as is.
    #[error("{source}")]
    Job {
        stage: Stage,
        /// Zero-based position of the job within its stage.
        index: usize,
        /// Reference asset the job was built from.
        reference: String,
        source: ComputeError,
    },

    /// A completed job returned a payload the next stage cannot use.
    #[error("{stage} job {} returned an unusable result: {reason}", index + 1)]
    InvalidResult {
        stage: Stage,
        index: usize,
        reason: String,
    },

    /// The results could not be handed off.
    #[error("Result handoff failed: {0}")]
    Handoff(String),
}

impl PipelineError {
    /// The compute failure behind a job error, if that is what this is.
    pub fn compute_error(&self) -> Option<&ComputeError> {
        match self {
            Self::Job { source, .. } => Some(source),
            _ => None,
        }
    }
}
