/// Domain errors raised before any remote job is involved: bad run inputs,
/// missing image records, unreadable local data.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A record the run depends on does not exist, e.g. no uploaded image.
    #[error("No {entity} found for '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Run inputs are missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Local I/O or decoding failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
