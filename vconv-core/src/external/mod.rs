// ============================================================================
// vconv-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates every interaction with the external transcoding
// engine. The orchestrator only sees the Prober and Transcoder traits, which
// keeps the decision logic testable with in-process fakes.
//
// KEY COMPONENTS:
// - Transcoder: Trait for running one ffmpeg conversion
// - FfmpegTranscoder / FfprobeProber: Production implementations
// - build_conversion_args: Pure ffmpeg argument builder
// - check_dependency: Startup check for required tools

use crate::error::{CoreError, CoreResult, command_failed_error};
use crate::util::command::{ProcessOutput, run_command};

use log::{debug, error};

use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

// ============================================================================
// SUBMODULES
// ============================================================================

/// ffmpeg argument building for conversions
pub mod ffmpeg;

/// Conversion execution through ffmpeg-sidecar
pub mod ffmpeg_executor;

/// Media inspection through ffprobe
pub mod ffprobe_executor;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg::{AAC_BITRATE, ConversionArgs, build_conversion_args};
pub use ffmpeg_executor::FfmpegTranscoder;
pub use ffprobe_executor::FfprobeProber;

/// How long a `-version` dependency check may take.
const DEPENDENCY_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// TRANSCODER TRAIT
// ============================================================================

/// Runs one ffmpeg invocation with the given arguments.
///
/// Implementations must kill the process once `timeout` elapses and report
/// that through [`ProcessOutput::timed_out`]. A process that ran but failed
/// is an `Ok` output with a non-success status; `Err` is reserved for
/// processes that could not be started or waited on.
pub trait Transcoder: Sync {
    fn transcode(&self, args: &[String], timeout: Option<Duration>) -> CoreResult<ProcessOutput>;

    /// Program name shown in recorded command lines.
    fn program(&self) -> String {
        "ffmpeg".to_string()
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that `program` can be executed by running `program -version`.
///
/// A program that cannot be found yields [`CoreError::DependencyNotFound`];
/// one that runs but fails yields [`CoreError::CommandFailed`].
pub(crate) fn check_dependency(program: &Path) -> CoreResult<()> {
    let name = program.display().to_string();
    let mut cmd = Command::new(program);
    cmd.arg("-version");

    match run_command(&mut cmd, &name, Some(DEPENDENCY_CHECK_TIMEOUT)) {
        Ok(output) if output.success() => {
            debug!(
                "Found dependency {name}: {}",
                output.stdout.lines().next().unwrap_or_default()
            );
            Ok(())
        }
        Ok(output) => {
            error!(
                "Dependency check for {name} failed (exit: {:?}, timed out: {})",
                output.exit_code(),
                output.timed_out
            );
            match output.status {
                Some(status) => Err(command_failed_error(name, status, output.stderr.trim())),
                None => Err(CoreError::OperationFailed(format!(
                    "{name} -version did not finish within {}s",
                    DEPENDENCY_CHECK_TIMEOUT.as_secs()
                ))),
            }
        }
        Err(CoreError::CommandStart(_, e)) if e.kind() == io::ErrorKind::NotFound => {
            error!("Dependency '{name}' not found.");
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) => Err(e),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency() {
        let err = check_dependency(Path::new("vconv-no-such-tool")).unwrap_err();
        assert!(matches!(err, CoreError::DependencyNotFound(name) if name == "vconv-no-such-tool"));
    }

    #[test]
    fn test_failing_dependency() {
        // `false -version` starts but exits non-zero
        let err = check_dependency(Path::new("false")).unwrap_err();
        assert!(matches!(err, CoreError::CommandFailed { .. }));
    }

    #[test]
    fn test_present_dependency() {
        // `true` ignores its arguments and succeeds
        assert!(check_dependency(Path::new("true")).is_ok());
    }
}
