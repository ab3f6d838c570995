//! Error types for input normalization

use thiserror::Error;

/// Raised when caller-supplied input cannot be normalized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UtilError {
    #[error("Invalid participant id '{0}': expected 7 or 8 digits")]
    InvalidParticipantId(String),

    #[error("Invalid date '{value}': {message}")]
    InvalidDate { value: String, message: String },

    #[error("Invalid time '{value}': {message}")]
    InvalidTime { value: String, message: String },
}

pub type UtilResult<T> = std::result::Result<T, UtilError>;
