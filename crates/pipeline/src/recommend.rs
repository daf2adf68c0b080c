//! Location recommendation.
//!
//! Asks the recommendation service to analyse the source photo. The
//! analysis feeds the marker positions stored alongside the image record,
//! so it runs before a marker is selected.

use lumterior_compute::{ComputeService, JobRunner};
use lumterior_core::job::{JobRequest, JobResult, RecommendationRequest};
use lumterior_core::record::SourceImage;

use crate::error::{PipelineError, Stage};

pub struct LocationRecommender<S> {
    runner: JobRunner<S>,
}

impl<S: ComputeService> LocationRecommender<S> {
    pub fn new(runner: JobRunner<S>) -> Self {
        Self { runner }
    }

    /// Submit a recommendation job for `source` and wait for its result.
    pub async fn recommend(&self, source: &SourceImage) -> Result<JobResult, PipelineError> {
        source.validate()?;

        let request: JobRequest = RecommendationRequest {
            image_url: source.url.clone(),
        }
        .into();

        tracing::info!(source = %source.name, "Requesting location recommendation");
        let result = self
            .runner
            .run(&request)
            .await
            .map_err(|e| PipelineError::Job {
                stage: Stage::Recommendation,
                index: 0,
                reference: source.name.clone(),
                source: e,
            })?;
        tracing::info!(source = %source.name, "Location recommendation ready");

        Ok(result)
    }
}
