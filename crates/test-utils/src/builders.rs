#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use opvisor::config::{ClassifySection, ConfigFile, ConfigSection, OperationConfig, RawConfigFile};
use opvisor::operation::LaunchRequest;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                classify: ClassifySection::default(),
                operation: BTreeMap::new(),
            },
        }
    }

    pub fn with_operation(mut self, name: &str, op: OperationConfig) -> Self {
        self.config.operation.insert(name.to_string(), op);
        self
    }

    pub fn log_limit(mut self, limit: usize) -> Self {
        self.config.config.log_limit = limit;
        self
    }

    pub fn operation_limit(mut self, limit: usize) -> Self {
        self.config.config.operation_limit = limit;
        self
    }

    pub fn status_tail(mut self, tail: usize) -> Self {
        self.config.config.status_tail = tail;
        self
    }

    pub fn error_pattern(mut self, pattern: &str) -> Self {
        self.config.classify.error = Some(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `OperationConfig`.
pub struct OperationConfigBuilder {
    op: OperationConfig,
}

impl OperationConfigBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            op: OperationConfig {
                kind: None,
                program: program.to_string(),
                script: None,
                args: vec![],
                cwd: None,
                env: BTreeMap::new(),
            },
        }
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.op.kind = Some(kind.to_string());
        self
    }

    pub fn script(mut self, script: impl Into<PathBuf>) -> Self {
        self.op.script = Some(script.into());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.op.args.push(arg.to_string());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.op.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.op.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> OperationConfig {
        self.op
    }
}

/// Builder for `LaunchRequest`.
pub struct LaunchRequestBuilder {
    request: LaunchRequest,
}

impl LaunchRequestBuilder {
    pub fn new(kind: &str, program: &str) -> Self {
        Self {
            request: LaunchRequest::new(kind, program),
        }
    }

    /// `sh -c <script>`; the usual way tests describe a process.
    pub fn shell(kind: &str, script: &str) -> Self {
        Self::new(kind, "sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.request.args.push(arg.to_string());
        self
    }

    pub fn script(mut self, script: impl Into<PathBuf>) -> Self {
        self.request.script = Some(script.into());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.request.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.request.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> LaunchRequest {
        self.request
    }
}
