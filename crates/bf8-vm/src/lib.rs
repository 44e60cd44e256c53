//! Execution engine for bf8 programs.
//!
//! [`engine::run`] interprets a filtered command stream against a growable byte tape
//! and reports how the run ended together with scan diagnostics.

pub mod command;
pub mod engine;

pub use command::{filter_commands, render, Command};
pub use engine::{run, run_source, run_with_options, RunOptions, RunResult, Status, Tape};
