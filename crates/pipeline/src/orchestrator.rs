//! Two-stage lighting pipeline.
//!
//! Stage 1 generates one lighting variant per reference asset, strictly in
//! list order under the default policy since the compute service handles one
//! variant job at a time. Stage 2 submits one mask job per variant and waits
//! for all of them. Each stage produces a finished, ordered sequence before
//! the next one reads it.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use lumterior_compute::{ComputeError, ComputeService, JobRunner};
use lumterior_core::job::{GenerateMaskRequest, JobRequest, JobResult, ProcessImageRequest};
use lumterior_core::progress::ProgressReporter;
use lumterior_core::record::{MarkerSelection, SourceImage};
use lumterior_core::reference::ReferenceAsset;
use lumterior_core::CoreError;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Stage};
use crate::stage::run_stage;

/// Label reported when a run starts.
pub const RUN_STARTED_LABEL: &str = "Synthesizing lighting...";

/// Label reported before the mask stage.
pub const MASK_STAGE_LABEL: &str = "Generating masks...";

/// Label reported before variant job `index` (zero-based) of `total`.
pub fn variant_label(index: usize, total: usize) -> String {
    format!("Synthesizing lighting {} of {total}...", index + 1)
}

/// Drives variant and mask generation for one source image.
///
/// A single orchestrator may serve many runs; each call to
/// [`run`](Self::run) owns its own state and nothing survives it.
pub struct PipelineOrchestrator<S> {
    runner: JobRunner<S>,
    config: PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl<S: ComputeService> PipelineOrchestrator<S> {
    pub fn new(runner: JobRunner<S>, config: PipelineConfig) -> Self {
        Self {
            runner,
            config,
            reporter: Arc::new(()),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Generate one lighting variant per reference asset, then a mask for
    /// each variant.
    ///
    /// Returns the variant results in the order of `references`. Mask
    /// results are not returned. Any failure rejects the whole run and no
    /// partial results are surfaced. Progress is cleared when the run
    /// settles either way.
    pub async fn run(
        &self,
        source: &SourceImage,
        selection: &MarkerSelection,
        references: &[ReferenceAsset],
    ) -> Result<Vec<JobResult>, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "pipeline_run",
            %run_id,
            source = %source.name,
            cluster_id = selection.cluster_id,
        );

        let outcome = self
            .execute(source, selection, references)
            .instrument(span)
            .await;
        self.reporter.clear();

        match &outcome {
            Ok(results) => {
                tracing::info!(%run_id, variants = results.len(), "Pipeline run completed");
            }
            Err(e) => {
                tracing::error!(%run_id, error = %e, "Pipeline run failed");
            }
        }
        outcome
    }

    async fn execute(
        &self,
        source: &SourceImage,
        selection: &MarkerSelection,
        references: &[ReferenceAsset],
    ) -> Result<Vec<JobResult>, PipelineError> {
        validate_inputs(source, selection)?;
        if references.is_empty() {
            tracing::info!("No reference assets, nothing to generate");
            return Ok(Vec::new());
        }

        self.reporter.report(RUN_STARTED_LABEL);
        let variants = self
            .generate_variants(source, selection, references)
            .await?;

        let masks = mask_requests(source, references, &variants)?;
        self.reporter.report(MASK_STAGE_LABEL);
        self.generate_masks(references, masks).await?;

        Ok(variants)
    }

    // ---- stages ----

    async fn generate_variants(
        &self,
        source: &SourceImage,
        selection: &MarkerSelection,
        references: &[ReferenceAsset],
    ) -> Result<Vec<JobResult>, PipelineError> {
        let total = references.len();
        let policy = self.config.variant_stage;
        tracing::info!(
            jobs = total,
            max_concurrency = policy.width(total),
            "Variant stage started",
        );

        run_stage(policy, references.iter().collect(), |index, reference| {
            let request: JobRequest = ProcessImageRequest {
                image_path: source.url.clone(),
                mask_path: selection.mask_url.clone(),
                reference_path: reference.url.clone(),
                output_dir: reference.output_tag(),
                seed: self.config.seed,
                scale: self.config.scale,
            }
            .into();

            async move {
                self.reporter.report(&variant_label(index, total));
                let result = self
                    .runner
                    .run(&request)
                    .await
                    .map_err(|e| job_error(Stage::Variant, index, reference, e))?;
                tracing::info!(
                    index,
                    reference = %reference.label,
                    processed_image_path = result.processed_image_path().unwrap_or(""),
                    "Variant generated",
                );
                Ok::<_, PipelineError>(result)
            }
        })
        .await
    }

    async fn generate_masks(
        &self,
        references: &[ReferenceAsset],
        requests: Vec<JobRequest>,
    ) -> Result<(), PipelineError> {
        let total = requests.len();
        let policy = self.config.mask_stage;
        tracing::info!(
            jobs = total,
            max_concurrency = policy.width(total),
            "Mask stage started",
        );

        let jobs: Vec<_> = references.iter().zip(requests).collect();
        let masks = run_stage(policy, jobs, |index, (reference, request)| async move {
            let result = self
                .runner
                .run(&request)
                .await
                .map_err(|e| job_error(Stage::Mask, index, reference, e))?;
            tracing::info!(
                index,
                reference = %reference.label,
                mask_path = result.mask_path().unwrap_or(""),
                "Mask generated",
            );
            Ok::<_, PipelineError>(result)
        })
        .await?;

        tracing::info!(masks = masks.len(), "Mask stage completed");
        Ok(())
    }
}

fn validate_inputs(source: &SourceImage, selection: &MarkerSelection) -> Result<(), CoreError> {
    source.validate()?;
    if selection.mask_url.trim().is_empty() {
        return Err(CoreError::validation(format!(
            "Marker {} has no mask image",
            selection.cluster_id
        )));
    }
    Ok(())
}

/// Build the mask job for every variant, pairing them by position. Fails
/// before any mask job starts if a variant result lacks its image path.
fn mask_requests(
    source: &SourceImage,
    references: &[ReferenceAsset],
    variants: &[JobResult],
) -> Result<Vec<JobRequest>, PipelineError> {
    variants
        .iter()
        .zip(references)
        .enumerate()
        .map(|(index, (variant, reference))| {
            let processed = variant.processed_image_path().ok_or_else(|| {
                PipelineError::InvalidResult {
                    stage: Stage::Variant,
                    index,
                    reason: "missing processed_image_path".into(),
                }
            })?;
            Ok(GenerateMaskRequest {
                processed_image_path: processed.to_string(),
                original_image_path: source.url.clone(),
                reference_path: reference.url.clone(),
            }
            .into())
        })
        .collect()
}

fn job_error(
    stage: Stage,
    index: usize,
    reference: &ReferenceAsset,
    source: ComputeError,
) -> PipelineError {
    tracing::warn!(
        stage = %stage,
        index,
        reference = %reference.label,
        error = %source,
        "Pipeline job failed",
    );
    PipelineError::Job {
        stage,
        index,
        reference: reference.label.clone(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn source() -> SourceImage {
        SourceImage::new("room.jpg", "https://b.s3.r.amazonaws.com/room.jpg")
    }

    fn lamps() -> Vec<ReferenceAsset> {
        ["https://h/lamp1.png", "https://h/lamp2.png"]
            .iter()
            .enumerate()
            .map(|(i, url)| ReferenceAsset::from_url(*url, i).unwrap())
            .collect()
    }

    #[test]
    fn labels_are_one_based() {
        assert_eq!(variant_label(0, 3), "Synthesizing lighting 1 of 3...");
        assert_eq!(variant_label(2, 3), "Synthesizing lighting 3 of 3...");
    }

    #[test]
    fn complete_inputs_pass() {
        let selection = MarkerSelection {
            cluster_id: 1,
            mask_url: "https://m".into(),
        };
        assert_matches!(validate_inputs(&source(), &selection), Ok(()));
    }

    #[test]
    fn blank_mask_rejected() {
        let selection = MarkerSelection {
            cluster_id: 4,
            mask_url: " ".into(),
        };
        assert_matches!(
            validate_inputs(&source(), &selection),
            Err(CoreError::Validation(msg)) if msg.contains("Marker 4")
        );
    }

    #[test]
    fn mask_requests_pair_by_position() {
        let variants = vec![
            JobResult::new(json!({"processed_image_path": "/out/lamp1.png"})),
            JobResult::new(json!({"processed_image_path": "/out/lamp2.png"})),
        ];

        let requests = mask_requests(&source(), &lamps(), &variants).unwrap();
        let bodies: Vec<_> = requests.iter().map(|r| r.body().unwrap()).collect();

        assert_eq!(bodies[0]["processed_image_path"], "/out/lamp1.png");
        assert_eq!(bodies[0]["reference_path"], "https://h/lamp1.png");
        assert_eq!(bodies[1]["processed_image_path"], "/out/lamp2.png");
        assert_eq!(bodies[1]["reference_path"], "https://h/lamp2.png");
        assert!(bodies
            .iter()
            .all(|b| b["original_image_path"] == "https://b.s3.r.amazonaws.com/room.jpg"));
    }

    #[test]
    fn variant_without_image_path_is_invalid() {
        let variants = vec![
            JobResult::new(json!({"processed_image_path": "/out/lamp1.png"})),
            JobResult::new(json!({"s3_urls": {}})),
        ];

        assert_matches!(
            mask_requests(&source(), &lamps(), &variants),
            Err(PipelineError::InvalidResult { stage: Stage::Variant, index: 1, .. })
        );
    }
}
