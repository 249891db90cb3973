// src/config/validate.rs

use crate::config::model::{ClassifySection, ConfigFile, RawConfigFile};
use crate::errors::{OpvisorError, Result};
use crate::multiplex::classify::{
    Classifier, DEFAULT_ERROR_PATTERN, DEFAULT_SUCCESS_PATTERN, DEFAULT_WARN_PATTERN,
};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::OpvisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.classify, raw.operation))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_operations(cfg)?;
    validate_global_config(cfg)?;
    validate_operations(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn ensure_has_operations(cfg: &RawConfigFile) -> Result<()> {
    if cfg.operation.is_empty() {
        return Err(OpvisorError::ConfigError(
            "config must contain at least one [operation.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.log_limit == 0 {
        return Err(OpvisorError::ConfigError(
            "[config].log_limit must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.operation_limit == 0 {
        return Err(OpvisorError::ConfigError(
            "[config].operation_limit must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_operations(cfg: &RawConfigFile) -> Result<()> {
    for (name, op) in cfg.operation.iter() {
        if op.program.trim().is_empty() {
            return Err(OpvisorError::ConfigError(format!(
                "operation '{}' has an empty `program`",
                name
            )));
        }
        if let Some(kind) = &op.kind {
            if kind.trim().is_empty() {
                return Err(OpvisorError::ConfigError(format!(
                    "operation '{}' has an empty `kind`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    build_classifier(&cfg.classify)?;
    Ok(())
}

/// Compile the classifier described by a `[classify]` section.
pub fn build_classifier(section: &ClassifySection) -> Result<Classifier> {
    Classifier::new(
        section.error.as_deref().unwrap_or(DEFAULT_ERROR_PATTERN),
        section.success.as_deref().unwrap_or(DEFAULT_SUCCESS_PATTERN),
        section.warn.as_deref().unwrap_or(DEFAULT_WARN_PATTERN),
    )
}
