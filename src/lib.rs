// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod multiplex;
pub mod operation;
pub mod registry;
pub mod runner;
pub mod stream;
pub mod supervisor;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::errors::OpvisorError;
use crate::exec::{LaunchPlan, ProcessLauncher};
use crate::operation::LaunchRequest;
use crate::runner::{RunSummary, drive};
use crate::supervisor::{Settings, Supervisor};

pub use crate::multiplex::OperationHandle;
pub use crate::operation::{LogEntry, OperationRecord, OperationSnapshot};
pub use crate::stream::{StreamEvent, Subscription};
pub use crate::types::{OperationId, OperationStatus, Severity, StreamKind};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - supervisor with the real process launcher
/// - launching + rendering the selected operations
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let cfg = load_and_validate(&args.config)?;
    let root = config_root_dir(&args.config);
    let requests = select_requests(&cfg, &args.operations, &root)?;

    if args.dry_run {
        print_dry_run(&cfg, &requests);
        return Ok(RunSummary::default());
    }

    let settings = Settings::from(&cfg);
    let supervisor = Supervisor::new(settings, ProcessLauncher::new())?;
    info!(operations = requests.len(), "launching operations");

    let mut stdout = std::io::stdout();
    let summary = tokio::select! {
        res = drive(&supervisor, requests, args.format, &mut stdout) => res?,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            info!("interrupted; no longer following operations");
            RunSummary {
                unfinished: supervisor
                    .list()
                    .iter()
                    .filter(|r| !r.status.is_terminal())
                    .count(),
                ..RunSummary::default()
            }
        }
    };

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        unfinished = summary.unfinished,
        "all operation streams ended"
    );
    Ok(summary)
}

/// Figure out the directory operation `cwd`s are relative to.
///
/// - If the config path has a non-empty parent (e.g. "ops/Opvisor.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Opvisor.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Launch requests for the named operations, or for all of them when no
/// names are given (in config order).
pub fn select_requests(
    cfg: &ConfigFile,
    names: &[String],
    root: &Path,
) -> std::result::Result<Vec<LaunchRequest>, OpvisorError> {
    if names.is_empty() {
        return Ok(cfg
            .operation
            .iter()
            .map(|(name, op)| op.to_request(name, root))
            .collect());
    }

    names
        .iter()
        .map(|name| {
            cfg.operation
                .get(name)
                .map(|op| op.to_request(name, root))
                .ok_or_else(|| OpvisorError::NotFound(format!("operation '{name}' in config")))
        })
        .collect()
}

/// Simple dry-run output: print limits and resolved commands.
fn print_dry_run(cfg: &ConfigFile, requests: &[LaunchRequest]) {
    let unbuffered = Some(cfg.config.unbuffered_env.as_str()).filter(|k| !k.is_empty());

    println!("opvisor dry-run");
    println!("  config.log_limit = {}", cfg.config.log_limit);
    println!("  config.operation_limit = {}", cfg.config.operation_limit);
    println!("  config.status_tail = {}", cfg.config.status_tail);
    println!();

    println!("operations ({}):", requests.len());
    for request in requests {
        let plan = LaunchPlan::from_request(request, unbuffered);
        println!("  - {}", request.kind);
        println!("      cmd: {}", plan.display_command());
        if let Some(ref cwd) = plan.cwd {
            println!("      cwd: {}", cwd.display());
        }
        if !plan.env.is_empty() {
            let env: Vec<String> = plan.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
            println!("      env: {}", env.join(" "));
        }
    }

    debug!("dry-run complete (no execution)");
}
