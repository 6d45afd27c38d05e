use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArmplanError {
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("invalid sequence status: {0}")]
    InvalidStatus(String),

    #[error("invalid timestamp '{0}': expected ISO-8601")]
    InvalidTimestamp(String),

    #[error("invalid value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("image rejected: {0}")]
    ImageRejected(String),

    #[error("image payload of {size} bytes exceeds limit of {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArmplanError>;
