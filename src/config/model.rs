// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::exec::DEFAULT_UNBUFFERED_ENV;
use crate::operation::LaunchRequest;
use crate::registry::{DEFAULT_LOG_LIMIT, DEFAULT_OPERATION_LIMIT};

/// Entries returned by a status query when not configured.
pub const DEFAULT_STATUS_TAIL: usize = 200;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// log_limit = 2000
/// operation_limit = 50
///
/// [operation.build]
/// program = "python3"
/// script = "scripts/build.py"
/// args = ["--mode", "full"]
/// ```
///
/// All sections except `[operation.<name>]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub classify: ClassifySection,

    /// All operations from `[operation.<name>]`, keyed by name.
    #[serde(default)]
    pub operation: BTreeMap<String, OperationConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)` or
/// [`load_and_validate`](super::load_and_validate).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub classify: ClassifySection,
    pub operation: BTreeMap<String, OperationConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        classify: ClassifySection,
        operation: BTreeMap<String, OperationConfig>,
    ) -> Self {
        Self {
            config,
            classify,
            operation,
        }
    }
}

/// `[config]` section: supervisor capacity and launch knobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigSection {
    /// Log entries retained per operation (oldest dropped first).
    #[serde(default = "default_log_limit")]
    pub log_limit: usize,

    /// Tracked operations before finished ones are evicted.
    #[serde(default = "default_operation_limit")]
    pub operation_limit: usize,

    /// Entries included in a status response.
    #[serde(default = "default_status_tail")]
    pub status_tail: usize,

    /// Environment variable set to `1` in every child to force unbuffered
    /// output. An empty string disables the override.
    #[serde(default = "default_unbuffered_env")]
    pub unbuffered_env: String,
}

fn default_log_limit() -> usize {
    DEFAULT_LOG_LIMIT
}

fn default_operation_limit() -> usize {
    DEFAULT_OPERATION_LIMIT
}

fn default_status_tail() -> usize {
    DEFAULT_STATUS_TAIL
}

fn default_unbuffered_env() -> String {
    DEFAULT_UNBUFFERED_ENV.to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            log_limit: default_log_limit(),
            operation_limit: default_operation_limit(),
            status_tail: default_status_tail(),
            unbuffered_env: default_unbuffered_env(),
        }
    }
}

/// `[classify]` section: optional regex overrides for line classification.
///
/// Patterns are matched case-insensitively; unset entries keep the
/// built-in indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClassifySection {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub warn: Option<String>,
}

/// `[operation.<name>]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperationConfig {
    /// Category tag; defaults to the operation's name.
    #[serde(default)]
    pub kind: Option<String>,

    /// Executable (looked up on `PATH` when not a path).
    pub program: String,

    /// Optional script passed to `program` as its first argument.
    /// Must exist; relative paths resolve against `cwd`.
    #[serde(default)]
    pub script: Option<PathBuf>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory, relative to the config file's directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the child.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl OperationConfig {
    /// Build the launch request for this operation, resolving `cwd`
    /// relative to `root` (the config file's directory).
    pub fn to_request(&self, name: &str, root: &Path) -> LaunchRequest {
        let cwd = match &self.cwd {
            Some(cwd) => root.join(cwd),
            None => root.to_path_buf(),
        };

        LaunchRequest {
            kind: self.kind.clone().unwrap_or_else(|| name.to_string()),
            program: self.program.clone(),
            script: self.script.clone(),
            args: self.args.clone(),
            cwd: Some(cwd),
            env: self.env.clone(),
        }
    }
}
