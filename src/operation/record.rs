// src/operation/record.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{OperationId, OperationStatus, Severity, StreamKind};

/// What a caller asks the supervisor to run.
///
/// `program` is the executable (resolved through `PATH` by the OS at spawn
/// time). When `script` is set it is the launch target handed to `program`
/// as its first argument, the way an interpreter runs a script; the script
/// must exist when the operation is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub kind: String,
    pub program: String,
    pub script: Option<PathBuf>,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl LaunchRequest {
    pub fn new(kind: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            program: program.into(),
            script: None,
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    /// Full argument vector passed to `program`: the script (if any)
    /// followed by the caller's arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        if let Some(script) = &self.script {
            argv.push(script.to_string_lossy().into_owned());
        }
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// One classified line of process output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub ts: DateTime<Utc>,
    pub level: Severity,
    /// Status hint derived from the line's content. This is *not* the
    /// operation's authoritative status.
    pub status: OperationStatus,
    pub stream: StreamKind,
    pub line: String,
}

/// Operation record without its log body.
///
/// Launch parameters (`kind`, `program`, `script`, `args`, `cwd`) are fixed
/// at creation. `status`, `ended_at`, `exit_code` and `pid` are written only
/// by the launcher's events; `last_error` only by appended error lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub id: OperationId,
    pub kind: String,
    pub program: String,
    pub script: Option<PathBuf>,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub status: OperationStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub pid: Option<u32>,
    pub last_error: Option<String>,
}

impl OperationRecord {
    /// Fresh `running` record for a request.
    pub fn running(id: OperationId, request: &LaunchRequest, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: request.kind.clone(),
            program: request.program.clone(),
            script: request.script.clone(),
            args: request.args.clone(),
            cwd: request.cwd.clone(),
            status: OperationStatus::Running,
            started_at,
            ended_at: None,
            exit_code: None,
            pid: None,
            last_error: None,
        }
    }
}

/// A record together with (part of) its retained log.
///
/// Returned by `get` (full log), by `status` (most recent slice) and
/// delivered once to every new subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSnapshot {
    #[serde(rename = "op")]
    pub operation: OperationRecord,
    pub logs: Vec<LogEntry>,
}
