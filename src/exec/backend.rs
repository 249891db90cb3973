// src/exec/backend.rs

//! Pluggable launcher backend abstraction.
//!
//! The supervisor hands every new operation to a `LauncherBackend` instead
//! of spawning processes itself. This makes it easy to swap in a fake
//! launcher in tests while keeping the production launcher in
//! [`process_runner`](super::process_runner).
//!
//! - `ProcessLauncher` is the default implementation used by `opvisor`. It
//!   spawns one Tokio task per operation running the real process.
//! - Tests can provide their own `LauncherBackend` that, for example, feeds
//!   scripted `OperationEvent`s straight into the handle.

use tokio::runtime::Handle;
use tracing::error;

use crate::multiplex::OperationHandle;
use crate::operation::OperationEvent;

use super::plan::LaunchPlan;
use super::process_runner::run_operation;

/// Trait abstracting how an operation's process is started.
///
/// `launch` must not wait for the process: it returns as soon as the launch
/// is initiated. From then on the backend is the only writer of the
/// operation's lifecycle events (`Spawned`, `StreamClosed`, `ProcessExited`,
/// `SpawnFailed`) and must eventually drive it to a terminal state unless
/// the process never exits.
pub trait LauncherBackend: Send + Sync {
    fn launch(&self, plan: LaunchPlan, handle: OperationHandle);
}

/// Real launcher backend used in production.
///
/// Must be used from within a Tokio runtime; outside one, the launch is
/// recorded as a spawn failure instead of panicking.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl LauncherBackend for ProcessLauncher {
    fn launch(&self, plan: LaunchPlan, handle: OperationHandle) {
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(run_operation(plan, handle));
            }
            Err(err) => {
                error!(op = %handle.id(), error = %err, "no async runtime available for launch");
                handle.apply(OperationEvent::SpawnFailed {
                    message: format!("failed to start '{}': {}", plan.program, err),
                });
            }
        }
    }
}
