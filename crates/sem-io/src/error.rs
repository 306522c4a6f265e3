//! Error types for sem-io.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("parse error in {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid source catalog: {0}")]
    InvalidCatalog(String),

    #[error("snapshot write failed: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
