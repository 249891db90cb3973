// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only failures that happen *before* an operation record exists surface
//! here. A process that fails to spawn or exits non-zero is recorded on the
//! operation itself and never becomes an `OpvisorError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpvisorError {
    /// Unknown operation id, or a launch target / working directory that
    /// does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid classification pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("JSON encoding error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, OpvisorError>;
