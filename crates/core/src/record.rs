//! Uploaded image records and marker selection.
//!
//! The document store keeps one record per uploaded photo together with
//! the marker clusters detected in it. A run is seeded from the most
//! recent record plus the marker the user clicked.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::storage::ObjectStore;
use crate::types::{ImageUrl, Timestamp};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Pixel position of a marker cluster on the displayed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterCenter {
    #[serde(deserialize_with = "extended_json::float")]
    pub x: f64,
    #[serde(deserialize_with = "extended_json::float")]
    pub y: f64,
}

/// One candidate light location detected in an uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskMarker {
    #[serde(deserialize_with = "extended_json::unsigned")]
    pub cluster_id: u32,
    pub cluster_center: ClusterCenter,
    /// Remaining keys. The uploader stores the mask image URL here under
    /// `mask_img_{cluster_id}`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MaskMarker {
    /// Mask image URL stored with the marker, if any.
    pub fn mask_url(&self) -> Option<&str> {
        self.extra
            .get(&format!("mask_img_{}", self.cluster_id))
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Document-store record of an uploaded interior photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub image_name: String,
    pub s3_url: ImageUrl,
    #[serde(default)]
    pub uploaded_at: Option<Timestamp>,
    #[serde(default)]
    pub mask_images: Vec<MaskMarker>,
}

/// The photo a run operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    pub name: String,
    pub url: ImageUrl,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Reject a source with no usable URL.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.url.trim().is_empty() {
            return Err(CoreError::Validation("No source image available".into()));
        }
        Ok(())
    }
}

/// The marker the user picked, resolved to its mask image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSelection {
    pub cluster_id: u32,
    pub mask_url: ImageUrl,
}

impl ImageRecord {
    pub fn source_image(&self) -> SourceImage {
        SourceImage::new(&self.image_name, &self.s3_url)
    }

    pub fn marker(&self, cluster_id: u32) -> Option<&MaskMarker> {
        self.mask_images.iter().find(|m| m.cluster_id == cluster_id)
    }

    /// Resolve the user's click on `cluster_id` to a mask URL.
    ///
    /// Uses the marker's stored mask URL when present, otherwise derives the
    /// conventional `{image_name}-masks/mask_cluster_{id}.png` location.
    pub fn select_marker(
        &self,
        cluster_id: u32,
        store: &ObjectStore,
    ) -> Result<MarkerSelection, CoreError> {
        let marker = self.marker(cluster_id).ok_or_else(|| {
            CoreError::Validation(format!(
                "Image '{}' has no marker cluster {cluster_id}",
                self.image_name
            ))
        })?;

        let mask_url = match marker.mask_url() {
            Some(url) => url.to_string(),
            None => store.mask_url(&self.image_name, cluster_id),
        };

        Ok(MarkerSelection {
            cluster_id,
            mask_url,
        })
    }
}

// ---------------------------------------------------------------------------
// Document store seam
// ---------------------------------------------------------------------------

/// Read side of the document store.
#[async_trait]
pub trait ImageRecordSource: Send + Sync {
    /// The most recently uploaded image.
    async fn latest_image(&self) -> Result<ImageRecord, CoreError>;
}

/// Reads an exported record (a single object, a list, or `{"image": ...}`)
/// from a JSON file.
pub struct JsonFileImageSource {
    path: PathBuf,
}

impl JsonFileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordDocument {
    Wrapped { image: ImageRecord },
    Single(ImageRecord),
    Many(Vec<ImageRecord>),
}

#[async_trait]
impl ImageRecordSource for JsonFileImageSource {
    async fn latest_image(&self) -> Result<ImageRecord, CoreError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CoreError::Internal(format!("Failed to read {}: {e}", self.path.display()))
        })?;

        let document: RecordDocument = serde_json::from_str(&raw).map_err(|e| {
            CoreError::Validation(format!("Malformed image record {}: {e}", self.path.display()))
        })?;

        let record = match document {
            RecordDocument::Wrapped { image } | RecordDocument::Single(image) => Some(image),
            // Newest upload wins; records without a timestamp sort first.
            RecordDocument::Many(records) => records.into_iter().max_by_key(|r| r.uploaded_at),
        };

        let record = record.ok_or_else(|| CoreError::NotFound {
            entity: "image",
            id: "latest".into(),
        })?;

        tracing::debug!(image_name = %record.image_name, "Loaded latest image record");
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Extended JSON numbers
// ---------------------------------------------------------------------------

/// Deserializers accepting plain JSON numbers as well as the
/// `{"$numberInt": "3"}` / `{"$numberDouble": "1.5"}` wrappers produced by
/// document-store exports.
mod extended_json {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Plain(f64),
        Text(String),
        Int {
            #[serde(rename = "$numberInt")]
            value: String,
        },
        Long {
            #[serde(rename = "$numberLong")]
            value: String,
        },
        Double {
            #[serde(rename = "$numberDouble")]
            value: String,
        },
    }

    fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let text = match Number::deserialize(deserializer)? {
            Number::Plain(n) => return Ok(n),
            Number::Text(value)
            | Number::Int { value }
            | Number::Long { value }
            | Number::Double { value } => value,
        };
        text.trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid number '{text}'")))
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        number(deserializer)
    }

    pub fn unsigned<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let n = number(deserializer)?;
        if n.fract() != 0.0 || n < 0.0 || n > f64::from(u32::MAX) {
            return Err(serde::de::Error::custom(format!(
                "expected a non-negative integer, got {n}"
            )));
        }
        Ok(n as u32)
    }
}
