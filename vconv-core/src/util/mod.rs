//! Shared helpers for running external processes.

pub mod command;

pub use command::{ProcessOutput, format_command, run_command, wait_with_timeout};
