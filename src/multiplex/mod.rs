// src/multiplex/mod.rs

//! Log multiplexer.
//!
//! Turns raw child output into classified entries and fans them out:
//!
//! - [`lines`] splits each pipe's bytes into lines, holding unterminated
//!   fragments until more bytes or EOF arrive.
//! - [`classify`] assigns severity and a derived status hint per line.
//! - [`fanout`] is the per-operation subscriber list.
//! - [`handle`] ties one operation's state machine, log and subscribers
//!   together behind a single lock.

pub mod classify;
pub mod fanout;
pub mod handle;
pub mod lines;

pub use classify::Classifier;
pub use fanout::{Fanout, SubscriberId};
pub use handle::OperationHandle;
pub use lines::LineSplitter;
