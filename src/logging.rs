// src/logging.rs

//! Logging setup for `opvisor` using `tracing` + `tracing-subscriber`.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` CLI flag (if provided), applied to every target;
//! 2. `OPVISOR_LOG`, read as `EnvFilter` directives
//!    (e.g. `info`, `opvisor=debug,opvisor::registry=trace`);
//! 3. `info`.
//!
//! Logs are sent to STDERR so that stdout carries only rendered operation
//! output.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "OPVISOR_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = resolve_filter(cli_level, std::env::var(LOG_ENV_VAR).ok());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

/// Build the filter from the CLI flag and the raw `OPVISOR_LOG` value.
///
/// Directives that do not parse are reported on stderr and replaced by
/// the default, since the subscriber that would log the problem does not
/// exist yet.
pub fn resolve_filter(cli_level: Option<LogLevel>, env_directives: Option<String>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_directive());
    }

    match env_directives.filter(|s| !s.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(&directives).unwrap_or_else(|err| {
            eprintln!("opvisor: ignoring invalid {LOG_ENV_VAR}={directives:?}: {err}");
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }),
        None => EnvFilter::new(DEFAULT_DIRECTIVES),
    }
}
