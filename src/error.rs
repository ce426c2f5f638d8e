use thiserror::Error;

#[derive(Error, Debug)]
pub enum HerdbookError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Lookup of '{id}' timed out after {timeout_ms}ms")]
    LookupTimeout { id: String, timeout_ms: u64 },

    #[error("A transit route needs at least {required} checkpoints, got {got}")]
    InsufficientCheckpoints { required: usize, got: usize },

    #[error("Record store error: {0}")]
    Store(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HerdbookError>;
