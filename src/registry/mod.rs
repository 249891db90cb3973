// src/registry/mod.rs

//! Operation registry.
//!
//! The registry exclusively owns the table of operations. It is a plain
//! value with its own lock, so several independent registries can coexist
//! (one per supervisor, one per test).
//!
//! Lock order is always registry table, then operation cell; operation
//! cells never reach back into the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use crate::errors::{OpvisorError, Result};
use crate::multiplex::{Classifier, OperationHandle};
use crate::operation::{LaunchRequest, OperationRecord, OperationSnapshot};
use crate::types::OperationId;

pub mod retention;

use retention::{RetentionCandidate, select_evictions};

pub const DEFAULT_OPERATION_LIMIT: usize = 50;
pub const DEFAULT_LOG_LIMIT: usize = 2000;

/// Capacity knobs for a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Tracked operations before finished ones are evicted.
    pub operation_limit: usize,
    /// Log entries retained per operation.
    pub log_limit: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            operation_limit: DEFAULT_OPERATION_LIMIT,
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }
}

#[derive(Debug, Default)]
struct RegistryTable {
    operations: HashMap<OperationId, OperationHandle>,
    next_sequence: u64,
}

#[derive(Debug)]
pub struct Registry {
    limits: RegistryLimits,
    classifier: Arc<Classifier>,
    table: Mutex<RegistryTable>,
}

impl Registry {
    pub fn new(limits: RegistryLimits, classifier: Arc<Classifier>) -> Self {
        Self {
            limits,
            classifier,
            table: Mutex::new(RegistryTable::default()),
        }
    }

    pub fn limits(&self) -> RegistryLimits {
        self.limits
    }

    /// Create a `running` record for `request`.
    ///
    /// Fails with `NotFound` if the request's launch script or working
    /// directory does not exist. Runs retention as a side effect.
    pub fn create(&self, request: &LaunchRequest) -> Result<OperationHandle> {
        check_launch_target(request)?;

        let now = Utc::now();
        let mut table = self.lock();

        let sequence = table.next_sequence;
        table.next_sequence += 1;
        let id = OperationId::new(now.timestamp_millis(), sequence);

        let record = OperationRecord::running(id.clone(), request, now);
        let handle = OperationHandle::new(
            record,
            sequence,
            self.limits.log_limit,
            Arc::clone(&self.classifier),
        );
        table.operations.insert(id.clone(), handle.clone());
        debug!(op = %id, kind = %request.kind, tracked = table.operations.len(), "operation created");

        self.prune(&mut table);
        Ok(handle)
    }

    pub fn handle(&self, id: &OperationId) -> Result<OperationHandle> {
        self.lock()
            .operations
            .get(id)
            .cloned()
            .ok_or_else(|| OpvisorError::NotFound(format!("operation {id}")))
    }

    /// Record plus the entire retained log.
    pub fn get(&self, id: &OperationId) -> Result<OperationSnapshot> {
        Ok(self.handle(id)?.snapshot())
    }

    /// Record plus the most recent `tail` log entries.
    pub fn status(&self, id: &OperationId, tail: usize) -> Result<OperationSnapshot> {
        Ok(self.handle(id)?.snapshot_tail(tail))
    }

    /// Summaries of every tracked operation, oldest first.
    pub fn list(&self) -> Vec<OperationRecord> {
        let mut handles: Vec<OperationHandle> = self.lock().operations.values().cloned().collect();
        handles.sort_by_key(|h| h.sequence());
        handles.iter().map(|h| h.record()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().operations.is_empty()
    }

    fn prune(&self, table: &mut RegistryTable) {
        if table.operations.len() <= self.limits.operation_limit {
            return;
        }

        let candidates = table
            .operations
            .values()
            .map(|handle| {
                let record = handle.record();
                RetentionCandidate {
                    id: record.id,
                    started_at: record.started_at,
                    sequence: handle.sequence(),
                    running: !record.status.is_terminal(),
                }
            })
            .collect();

        for id in select_evictions(candidates, self.limits.operation_limit) {
            table.operations.remove(&id);
            debug!(op = %id, "evicted finished operation");
        }

        if table.operations.len() > self.limits.operation_limit {
            debug!(
                tracked = table.operations.len(),
                limit = self.limits.operation_limit,
                "retention limit exceeded by running operations"
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fail with `NotFound` if the request's working directory or launch script
/// does not exist.
pub fn check_launch_target(request: &LaunchRequest) -> Result<()> {
    if let Some(cwd) = &request.cwd {
        if !cwd.is_dir() {
            return Err(OpvisorError::NotFound(format!(
                "working directory {}",
                cwd.display()
            )));
        }
    }

    if let Some(script) = &request.script {
        let resolved = match &request.cwd {
            Some(cwd) => cwd.join(script),
            None => script.clone(),
        };
        if !resolved.exists() {
            return Err(OpvisorError::NotFound(format!("script {}", resolved.display())));
        }
    }

    Ok(())
}
