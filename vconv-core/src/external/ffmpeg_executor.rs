// ============================================================================
// vconv-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Conversion Process Management
//
// Spawns ffmpeg through ffmpeg-sidecar and hands the child to the shared
// command helper, which captures both output streams and enforces the
// conversion timeout.

use crate::error::{CoreResult, command_start_error};
use crate::external::Transcoder;
use crate::util::command::{ProcessOutput, wait_with_timeout};

use ffmpeg_sidecar::command::FfmpegCommand;
use log::debug;

use std::path::PathBuf;
use std::time::Duration;

/// Production [`Transcoder`] backed by an ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    #[must_use]
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new(PathBuf::from("ffmpeg"))
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, args: &[String], timeout: Option<Duration>) -> CoreResult<ProcessOutput> {
        let mut cmd = FfmpegCommand::new_with_path(&self.program);
        // ffmpeg otherwise reads interactive commands from the piped stdin
        cmd.arg("-nostdin");
        cmd.args(args);
        debug!("Spawning ffmpeg: {cmd:?}");

        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error(self.program(), e))?;

        let output = wait_with_timeout(child.as_inner_mut(), "ffmpeg", timeout)?;
        Ok(output)
    }

    fn program(&self) -> String {
        self.program.display().to_string()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-ffmpeg");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_transcode_captures_exit_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo 'encoder broke' >&2\nexit 7");
        let transcoder = FfmpegTranscoder::new(script);

        let output = transcoder.transcode(&["-i".to_string(), "x".to_string()], None).unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code(), Some(7));
        assert!(output.stderr.contains("encoder broke"));
    }

    #[test]
    fn test_transcode_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "exec sleep 30");
        let transcoder = FfmpegTranscoder::new(script);

        let output = transcoder
            .transcode(&[], Some(Duration::from_millis(300)))
            .unwrap();
        assert!(output.timed_out);
        assert!(output.elapsed < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_is_a_start_error() {
        let transcoder = FfmpegTranscoder::new(PathBuf::from("/nonexistent/ffmpeg"));
        let err = transcoder.transcode(&[], None).unwrap_err();
        assert!(matches!(err, crate::CoreError::CommandStart(..)));
    }
}
