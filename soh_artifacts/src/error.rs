use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed artifact: {0}")]
    Malformed(String),
    #[error("shape mismatch: expected {expected} columns, got {actual}")]
    Columns { expected: usize, actual: usize },
    #[error("model input shape mismatch: expected {expected:?}, got {actual:?}")]
    InputShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("input length {len} is not a multiple of {cols} columns")]
    Ragged { len: usize, cols: usize },
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
