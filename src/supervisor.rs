// src/supervisor.rs

//! Operation supervisor: registry + launcher + multiplexer + publisher.
//!
//! Failures that happen before an operation exists (unknown id, missing
//! launch script or working directory) are returned synchronously. Anything
//! after that (spawn failure, non-zero exit) is only visible through the
//! operation's record and event stream, and never affects other operations.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::{ClassifySection, ConfigFile, DEFAULT_STATUS_TAIL, build_classifier};
use crate::errors::Result;
use crate::exec::{DEFAULT_UNBUFFERED_ENV, LaunchPlan, LauncherBackend};
use crate::operation::{LaunchRequest, OperationRecord, OperationSnapshot};
use crate::registry::{Registry, RegistryLimits};
use crate::stream::Subscription;
use crate::types::OperationId;

/// Path prefix under which an HTTP surface serves operation streams.
pub const STREAM_URL_PREFIX: &str = "/api/admin/ops";

/// Runtime knobs for a supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub limits: RegistryLimits,
    pub status_tail: usize,
    /// Variable set to `1` in every child; `None` disables the override.
    pub unbuffered_env: Option<String>,
    pub classify: ClassifySection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            limits: RegistryLimits::default(),
            status_tail: DEFAULT_STATUS_TAIL,
            unbuffered_env: Some(DEFAULT_UNBUFFERED_ENV.to_string()),
            classify: ClassifySection::default(),
        }
    }
}

impl From<&ConfigFile> for Settings {
    fn from(cfg: &ConfigFile) -> Self {
        let unbuffered_env = Some(cfg.config.unbuffered_env.clone()).filter(|k| !k.is_empty());
        Self {
            limits: RegistryLimits {
                operation_limit: cfg.config.operation_limit,
                log_limit: cfg.config.log_limit,
            },
            status_tail: cfg.config.status_tail,
            unbuffered_env,
            classify: cfg.classify.clone(),
        }
    }
}

/// Response to a launch request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReceipt {
    #[serde(rename = "op")]
    pub operation: OperationRecord,
    pub stream_url: String,
}

pub struct Supervisor<B: LauncherBackend> {
    settings: Settings,
    registry: Registry,
    backend: B,
}

impl<B: LauncherBackend> std::fmt::Debug for Supervisor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<B: LauncherBackend> Supervisor<B> {
    /// Fails only if a `[classify]` override does not compile.
    pub fn new(settings: Settings, backend: B) -> Result<Self> {
        let classifier = Arc::new(build_classifier(&settings.classify)?);
        let registry = Registry::new(settings.limits, classifier);
        Ok(Self {
            settings,
            registry,
            backend,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create a record and start its process without waiting for it.
    ///
    /// The returned record is always `running`; launch failures show up
    /// later on the record and its stream.
    pub fn launch(&self, request: LaunchRequest) -> Result<LaunchReceipt> {
        let handle = self.registry.create(&request)?;
        let plan = LaunchPlan::from_request(&request, self.settings.unbuffered_env.as_deref());
        let operation = handle.record();

        info!(
            op = %operation.id,
            kind = %operation.kind,
            cmd = %plan.display_command(),
            "launching operation"
        );

        self.backend.launch(plan, handle);

        Ok(LaunchReceipt {
            stream_url: stream_url(&operation.id),
            operation,
        })
    }

    /// Record plus the entire retained log.
    pub fn get(&self, id: &OperationId) -> Result<OperationSnapshot> {
        self.registry.get(id)
    }

    /// Record plus the most recent `status_tail` log entries.
    pub fn status(&self, id: &OperationId) -> Result<OperationSnapshot> {
        self.registry.status(id, self.settings.status_tail)
    }

    pub fn list(&self) -> Vec<OperationRecord> {
        self.registry.list()
    }

    pub fn subscribe(&self, id: &OperationId) -> Result<Subscription> {
        Ok(self.registry.handle(id)?.subscribe())
    }
}

pub fn stream_url(id: &OperationId) -> String {
    format!("{STREAM_URL_PREFIX}/{id}/stream")
}
