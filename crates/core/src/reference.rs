//! Reference assets: the light fixture images painted into the scene.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ImageUrl;

/// Lamp images offered when no reference set is configured.
pub const DEFAULT_REFERENCE_URLS: &[&str] = &[
    "https://lumterior.s3.ap-northeast-2.amazonaws.com/lamp/lamp1.png",
    "https://lumterior.s3.ap-northeast-2.amazonaws.com/lamp/lamp2.png",
    "https://lumterior.s3.ap-northeast-2.amazonaws.com/lamp/lamp3.png",
];

/// One style/input image supplied to a variant-generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceAsset {
    pub url: ImageUrl,
    /// Short name used to tag outputs, e.g. `lamp1`.
    pub label: String,
}

impl ReferenceAsset {
    /// Build an asset whose label is the file stem of `url`.
    ///
    /// `position` (zero-based) names the asset when the URL has no usable
    /// file name.
    pub fn from_url(url: impl Into<String>, position: usize) -> Result<Self, CoreError> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(CoreError::Validation(format!(
                "Reference asset {} has an empty URL",
                position + 1
            )));
        }

        let label = file_stem(&url)
            .map(str::to_string)
            .unwrap_or_else(|| format!("reference{}", position + 1));

        Ok(Self { url, label })
    }

    /// Output destination tag sent with the variant job, e.g. `lamp1_results`.
    pub fn output_tag(&self) -> String {
        format!("{}_results", self.label)
    }
}

/// Parse a list of URLs into assets, preserving order.
pub fn parse_references<I, S>(urls: I) -> Result<Vec<ReferenceAsset>, CoreError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    urls.into_iter()
        .enumerate()
        .map(|(i, url)| ReferenceAsset::from_url(url, i))
        .collect()
}

/// The built-in lamp set.
pub fn default_references() -> Vec<ReferenceAsset> {
    DEFAULT_REFERENCE_URLS
        .iter()
        .enumerate()
        .filter_map(|(i, url)| ReferenceAsset::from_url(*url, i).ok())
        .collect()
}

/// File stem of the last path segment, ignoring any query or fragment.
fn file_stem(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next()?;
    let stem = match last.rfind('.') {
        Some(0) | None => last,
        Some(dot) => &last[..dot],
    };
    if stem.is_empty() || stem.contains(':') {
        None
    } else {
        Some(stem)
    }
}
