//! Job requests submitted to the remote compute service and the opaque
//! results it hands back.
//!
//! Each [`JobKind`] maps to its own endpoint on the service. The kinds are
//! distinct remote operations rather than parameterised variants of one
//! call, so each carries its own body type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ImageUrl;

// ---------------------------------------------------------------------------
// Generation defaults
// ---------------------------------------------------------------------------

/// Seed sent with every variant-generation job unless configured otherwise.
pub const DEFAULT_SEED: u32 = 321;

/// Guidance scale sent with every variant-generation job unless configured
/// otherwise.
pub const DEFAULT_GUIDANCE_SCALE: f64 = 20.0;

// ---------------------------------------------------------------------------
// Job kinds
// ---------------------------------------------------------------------------

/// The remote operations the pipeline knows how to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Synthesize a lighting variant of the source image.
    VariantGeneration,
    /// Derive the light mask of a previously generated variant.
    MaskGeneration,
    /// Analyse the source image for recommended light locations.
    LocationRecommendation,
}

impl JobKind {
    /// Endpoint path (relative to the service base URL) that starts a job
    /// of this kind.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::VariantGeneration => "process_image",
            Self::MaskGeneration => "generate_mask",
            Self::LocationRecommendation => "run-higan",
        }
    }

    /// Headline used when the service refuses to start a job of this kind.
    pub fn failure_headline(self) -> &'static str {
        match self {
            Self::VariantGeneration => "Failed to process image",
            Self::MaskGeneration => "Failed to start mask generation",
            Self::LocationRecommendation => "Failed to start location recommendation",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VariantGeneration => "variant generation",
            Self::MaskGeneration => "mask generation",
            Self::LocationRecommendation => "location recommendation",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST {base}/process_image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessImageRequest {
    /// The uploaded interior photo.
    pub image_path: ImageUrl,
    /// Mask of the marker the user picked.
    pub mask_path: ImageUrl,
    /// The light fixture to paint into the scene.
    pub reference_path: ImageUrl,
    /// Output destination tag, e.g. `lamp1_results`.
    pub output_dir: String,
    pub seed: u32,
    pub scale: f64,
}

/// Body of `POST {base}/generate_mask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateMaskRequest {
    /// Path of the variant produced by the matching variant-generation job.
    pub processed_image_path: String,
    pub original_image_path: ImageUrl,
    pub reference_path: ImageUrl,
}

/// Body of `POST {base}/run-higan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub image_url: ImageUrl,
}

/// One immutable unit of work for the remote compute service.
#[derive(Debug, Clone, PartialEq)]
pub enum JobRequest {
    ProcessImage(ProcessImageRequest),
    GenerateMask(GenerateMaskRequest),
    Recommend(RecommendationRequest),
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            Self::ProcessImage(_) => JobKind::VariantGeneration,
            Self::GenerateMask(_) => JobKind::MaskGeneration,
            Self::Recommend(_) => JobKind::LocationRecommendation,
        }
    }

    /// The reference asset this job was built from, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::ProcessImage(r) => Some(&r.reference_path),
            Self::GenerateMask(r) => Some(&r.reference_path),
            Self::Recommend(_) => None,
        }
    }

    /// JSON body posted to the job's endpoint.
    pub fn body(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::ProcessImage(r) => serde_json::to_value(r),
            Self::GenerateMask(r) => serde_json::to_value(r),
            Self::Recommend(r) => serde_json::to_value(r),
        }
    }
}

impl From<ProcessImageRequest> for JobRequest {
    fn from(r: ProcessImageRequest) -> Self {
        Self::ProcessImage(r)
    }
}

impl From<GenerateMaskRequest> for JobRequest {
    fn from(r: GenerateMaskRequest) -> Self {
        Self::GenerateMask(r)
    }
}

impl From<RecommendationRequest> for JobRequest {
    fn from(r: RecommendationRequest) -> Self {
        Self::Recommend(r)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Opaque payload attached to a completed task.
///
/// The orchestrator only reads the handful of fields it needs to chain
/// jobs together; everything else passes through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobResult(serde_json::Value);

impl JobResult {
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.0
    }

    /// Service-local path of a generated variant. Required to chain a
    /// mask-generation job onto a variant result.
    pub fn processed_image_path(&self) -> Option<&str> {
        self.str_field("processed_image_path")
    }

    /// Public URL of a generated variant.
    pub fn s3_processed_image_path(&self) -> Option<&str> {
        self.str_field("s3_processed_image_path")
    }

    /// Every file uploaded for a variant, keyed by its relative path.
    pub fn s3_urls(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.0.get("s3_urls").and_then(serde_json::Value::as_object)
    }

    pub fn mask_path(&self) -> Option<&str> {
        self.str_field("mask_path")
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(serde_json::Value::as_str)
    }
}

impl From<serde_json::Value> for JobResult {
    fn from(payload: serde_json::Value) -> Self {
        Self(payload)
    }
}
