//! `lumterior-worker` -- runs one lighting pipeline headlessly.
//!
//! Loads the latest uploaded image record, optionally asks the
//! recommendation service to analyse it, generates a lighting variant and a
//! mask per reference asset for the selected marker, and stores the
//! results for the location-selection screen.
//!
//! # Environment variables
//!
//! See `WorkerConfig`, `ComputeConfig::from_env`, `PipelineConfig::from_env`
//! and `ObjectStore::from_env`. `DIFFUSION_API_URL`, `MARKER_CLUSTER_ID`,
//! `AWS_S3_BUCKET_NAME` and `AWS_S3_REGION` are required.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lumterior_compute::{ComputeApi, ComputeConfig, JobRunner, TaskPoller};
use lumterior_core::progress::TracingReporter;
use lumterior_core::record::{ImageRecordSource, JsonFileImageSource};
use lumterior_core::storage::ObjectStore;
use lumterior_pipeline::{
    JsonFileHandoff, LocationRecommender, PipelineConfig, PipelineOrchestrator, ResultHandoff,
};

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lumterior_worker=info,lumterior_pipeline=info,lumterior_compute=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let worker = WorkerConfig::from_env()?;
    let store = ObjectStore::from_env()?;
    let pipeline_config = PipelineConfig::from_env()?;
    let diffusion = ComputeConfig::from_env("DIFFUSION_API_URL")?;

    tracing::info!(
        base_url = %diffusion.base_url,
        cluster_id = worker.cluster_id,
        references = worker.references.len(),
        poll_interval_ms = diffusion.poll_interval.as_millis() as u64,
        "Starting lumterior-worker",
    );

    let images = JsonFileImageSource::new(&worker.latest_image_path);
    let mut record = images
        .latest_image()
        .await
        .context("Failed to load the latest image record")?;

    if worker.recommend {
        let recommender_config = ComputeConfig::from_env("RECOMMENDER_API_URL")?;
        let poller = TaskPoller::from_config(&recommender_config);
        let recommender =
            LocationRecommender::new(JobRunner::new(ComputeApi::new(recommender_config)?, poller));

        let recommendation = recommender.recommend(&record.source_image()).await?;
        tracing::debug!(result = %recommendation.payload(), "Recommendation payload");

        // Markers are written back to the record once the analysis lands.
        record = images
            .latest_image()
            .await
            .context("Failed to reload the image record after recommendation")?;
    }

    let selection = record.select_marker(worker.cluster_id, &store)?;
    let source = record.source_image();

    let poller = TaskPoller::from_config(&diffusion);
    let orchestrator = PipelineOrchestrator::new(
        JobRunner::new(ComputeApi::new(diffusion)?, poller),
        pipeline_config,
    )
    .with_reporter(Arc::new(TracingReporter));

    let results = orchestrator
        .run(&source, &selection, &worker.references)
        .await?;

    let handoff = JsonFileHandoff::from_env();
    let next = handoff.hand_off(selection.cluster_id, &results).await?;

    tracing::info!(
        results = results.len(),
        stored_at = %handoff.results_path().display(),
        continue_to = %next.path,
        "Pipeline finished",
    );

    Ok(())
}
