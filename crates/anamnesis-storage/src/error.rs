use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("delete error: {0}")]
    Delete(String),

    #[error("invalid case: {0}")]
    InvalidCase(String),

    #[error("API key is empty")]
    EmptyApiKey,
}
