// src/exec/mod.rs

//! Process launcher.
//!
//! This module is responsible for actually running an operation's command
//! with `tokio::process::Command` and reporting its lifecycle to the
//! operation's handle.
//!
//! - [`plan`] resolves a launch request into program, argv, cwd and
//!   environment overrides.
//! - [`process_runner`] spawns the child, drains stdout/stderr through the
//!   multiplexer and records the exit.
//! - [`backend`] provides the `LauncherBackend` trait and the concrete
//!   `ProcessLauncher` used in production, which tests can replace with a
//!   fake implementation.

pub mod backend;
pub mod plan;
pub mod process_runner;

pub use backend::{LauncherBackend, ProcessLauncher};
pub use plan::{DEFAULT_UNBUFFERED_ENV, LaunchPlan};
