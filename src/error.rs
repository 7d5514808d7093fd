//! Error types for the skillspec crate.

use thiserror::Error;

/// All errors the library surfaces across its public API.
#[derive(Debug, Error)]
pub enum SkillspecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("reconciliation failed: {0}")]
    Reconciliation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SkillspecError>;
