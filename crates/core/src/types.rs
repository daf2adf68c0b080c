/// Publicly fetchable URL of an uploaded or generated image.
///
/// The pipeline only ever passes these around as opaque strings.
pub type ImageUrl = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
