// ============================================================================
// vconv-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Core Error Types and Constructors
//
// This module defines the error taxonomy of the vconv-core library. Per-file
// and per-job problems (unreadable inputs, failed conversions, unverifiable
// checksums) are normally carried as values in the run summary; the variants
// here are for the cases where an operation cannot produce such a value.
//
// KEY COMPONENTS:
// - CoreError: Main error enum
// - CoreResult: Result alias used throughout the crate
// - Helper constructors for external command errors

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors produced by the vconv core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A required external tool (ffmpeg, ffprobe) could not be found.
    #[error("Required dependency '{0}' not found on PATH")]
    DependencyNotFound(String),

    #[error("Failed to start '{0}': {1}")]
    CommandStart(String, io::Error),

    #[error("Failed waiting for '{0}': {1}")]
    CommandWait(String, io::Error),

    #[error("'{cmd}' failed with {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    /// A plan was requested for a profile that is not plannable.
    #[error("Cannot plan conversion for unreadable file {}", .0.display())]
    PlanningImpossible(PathBuf),

    #[error("Verification unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type for vconv-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

pub(crate) fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub(crate) fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub(crate) fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}
