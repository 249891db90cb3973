// src/exec/plan.rs

use std::path::PathBuf;

use crate::operation::LaunchRequest;

/// Environment override that makes common interpreters flush output
/// line by line.
pub const DEFAULT_UNBUFFERED_ENV: &str = "PYTHONUNBUFFERED";

/// Fully resolved process invocation for one operation.
///
/// The child inherits the parent's environment; `env` lists the overrides
/// applied on top of it, the unbuffered-output switch last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl LaunchPlan {
    pub fn from_request(request: &LaunchRequest, unbuffered_env: Option<&str>) -> Self {
        let mut env: Vec<(String, String)> = request
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(key) = unbuffered_env.filter(|k| !k.is_empty()) {
            env.retain(|(k, _)| k != key);
            env.push((key.to_string(), "1".to_string()));
        }

        Self {
            program: request.program.clone(),
            args: request.argv(),
            cwd: request.cwd.clone(),
            env,
        }
    }

    /// Human-readable command line, for logs and dry runs.
    pub fn display_command(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.join(" ")
    }
}
