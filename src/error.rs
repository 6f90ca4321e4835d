//! Error types for the classification and ranking models.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model unavailable: {0}")]
    Unavailable(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("shape mismatch: expected {expected} columns, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("empty vocabulary; documents contain no indexable terms")]
    EmptyVocabulary,

    #[error("invalid model artifact: {0}")]
    Artifact(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
