use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmotionError {
    /// The landmark set does not cover every index the extractor reads.
    #[error("insufficient landmarks: need at least {required}, got {actual}")]
    InsufficientLandmarks { required: usize, actual: usize },

    #[error("landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark { index: usize },

    /// Flat coordinate buffer whose length is not a multiple of 3.
    #[error("malformed frame: {len} floats is not a whole number of (x, y, z) triples")]
    MalformedFrame { len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unknown session handle {0}")]
    UnknownSession(i64),
}

pub type Result<T> = std::result::Result<T, EmotionError>;
