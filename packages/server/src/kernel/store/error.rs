/// Errors returned by a `BaseStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The stored value could not be (de)serialized into the expected shape.
    #[error("store serialization error for key {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A backend-specific failure (bad response, missing config, etc.).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn serialization(key: &str, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.to_string(),
            source,
        }
    }
}
