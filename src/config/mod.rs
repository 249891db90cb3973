// src/config/mod.rs

//! Configuration loading and validation for opvisor.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate limits, operations and classification patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ClassifySection, ConfigFile, ConfigSection, DEFAULT_STATUS_TAIL, OperationConfig,
    RawConfigFile,
};
pub use validate::build_classifier;
