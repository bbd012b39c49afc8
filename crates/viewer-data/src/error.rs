//! Error types for the viewer-data crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Dataset not found: {dataset}")]
    NotFound { dataset: String },

    #[error("Sample call not found: {call_id}")]
    CallNotFound { call_id: String },

    #[error("Failed to read dataset {dataset}: {message}")]
    Read { dataset: String, message: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Failed to load sample calls: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
