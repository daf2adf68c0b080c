//! Public object-store addressing for uploaded and generated images.
//!
//! Uploaded photos, pre-computed marker masks and generated variants all
//! live in one S3 bucket and are referenced by their public virtual-hosted
//! URL. This module only builds and validates those URLs; uploads happen
//! elsewhere.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Environment variable naming the bucket.
pub const ENV_BUCKET: &str = "AWS_S3_BUCKET_NAME";

/// Environment variable naming the bucket's region.
pub const ENV_REGION: &str = "AWS_S3_REGION";

/// Suffix appended to an image name to form its mask folder.
const MASK_FOLDER_SUFFIX: &str = "-masks";

// ---------------------------------------------------------------------------
// ObjectStore
// ---------------------------------------------------------------------------

/// Bucket coordinates needed to derive public object URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStore {
    bucket: String,
    region: String,
}

impl ObjectStore {
    /// Validate and build a store handle.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Result<Self, CoreError> {
        let bucket = bucket.into().trim().to_string();
        let region = region.into().trim().to_string();

        if bucket.is_empty() || region.is_empty() {
            return Err(CoreError::Validation(
                "Object store bucket and region must both be set".into(),
            ));
        }
        if bucket.contains('/') {
            return Err(CoreError::Validation(format!(
                "Invalid bucket name '{bucket}'"
            )));
        }

        Ok(Self { bucket, region })
    }

    /// Load from `AWS_S3_BUCKET_NAME` / `AWS_S3_REGION`.
    pub fn from_env() -> Result<Self, CoreError> {
        let bucket = std::env::var(ENV_BUCKET).unwrap_or_default();
        let region = std::env::var(ENV_REGION).unwrap_or_default();
        if bucket.is_empty() || region.is_empty() {
            return Err(CoreError::Validation(format!(
                "Missing {ENV_BUCKET} or {ENV_REGION} environment variables"
            )));
        }
        Self::new(bucket, region)
    }

    /// Public URL of `key`, e.g.
    /// `https://bucket.s3.ap-northeast-2.amazonaws.com/lamp/lamp1.png`.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket,
            self.region,
            key.trim_start_matches('/')
        )
    }

    /// Public URL of the pre-computed mask for one marker cluster.
    pub fn mask_url(&self, image_name: &str, cluster_id: u32) -> String {
        self.public_url(&mask_key(image_name, cluster_id))
    }
}

/// Object key of the mask for `cluster_id` of `image_name`.
pub fn mask_key(image_name: &str, cluster_id: u32) -> String {
    format!("{image_name}{MASK_FOLDER_SUFFIX}/mask_cluster_{cluster_id}.png")
}
