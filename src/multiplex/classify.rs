// src/multiplex/classify.rs

//! Line classification by pattern matching.
//!
//! Rules are checked in a fixed order and the first match wins:
//! error, then success, then warning, otherwise info. All patterns are
//! compiled case-insensitively.

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};

use crate::errors::Result;
use crate::operation::LogEntry;
use crate::types::{OperationStatus, Severity, StreamKind};

pub const DEFAULT_ERROR_PATTERN: &str = r"\bERROR\b|\bFAIL\b|✖|❌|fatal";
pub const DEFAULT_SUCCESS_PATTERN: &str = r"✓|✅|\bSUCCESS\b|\bOK\b";
pub const DEFAULT_WARN_PATTERN: &str = r"warn|warning";

#[derive(Debug, Clone)]
pub struct Classifier {
    error: Regex,
    success: Regex,
    warn: Regex,
}

impl Classifier {
    pub fn new(error: &str, success: &str, warn: &str) -> Result<Self> {
        Ok(Self {
            error: compile(error)?,
            success: compile(success)?,
            warn: compile(warn)?,
        })
    }

    /// Classifier with the built-in indicator patterns.
    pub fn standard() -> Result<Self> {
        Self::new(
            DEFAULT_ERROR_PATTERN,
            DEFAULT_SUCCESS_PATTERN,
            DEFAULT_WARN_PATTERN,
        )
    }

    /// Severity and derived status hint for one line.
    pub fn classify(&self, line: &str) -> (Severity, OperationStatus) {
        let text = line.trim();
        if text.is_empty() {
            return (Severity::Info, OperationStatus::Running);
        }
        if self.error.is_match(text) {
            (Severity::Error, OperationStatus::Error)
        } else if self.success.is_match(text) {
            (Severity::Success, OperationStatus::Success)
        } else if self.warn.is_match(text) {
            (Severity::Warn, OperationStatus::Running)
        } else {
            (Severity::Info, OperationStatus::Running)
        }
    }

    /// Build a classified log entry for `line`.
    pub fn entry(&self, stream: StreamKind, line: String, ts: DateTime<Utc>) -> LogEntry {
        let (level, status) = self.classify(&line);
        LogEntry {
            ts,
            level,
            status,
            stream,
            line,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}
