//! Error types for Credit Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CreditError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid event at index {index}: {reason}")]
    InvalidEvent { index: usize, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CreditResult<T> = Result<T, CreditError>;
