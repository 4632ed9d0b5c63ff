//! ffprobe integration for media inspection.
//!
//! Runs ffprobe with JSON output under a timeout and turns every way it can
//! go wrong into a [`ProbeFailure`] rather than an error.

use crate::config::DEFAULT_PROBE_TIMEOUT;
use crate::media::probe::{ProbeFailure, ProbeOutcome, Prober, parse_ffprobe_json};
use crate::util::command::run_command;

use log::{debug, warn};

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Production [`Prober`] backed by an ffprobe binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
    timeout: Duration,
    /// Debug mode: verbose ffprobe logging and raw output kept on the outcome
    keep_raw: bool,
}

impl FfprobeProber {
    #[must_use]
    pub fn new(program: PathBuf, timeout: Duration, keep_raw: bool) -> Self {
        Self {
            program,
            timeout,
            keep_raw,
        }
    }

    fn command(&self, path: &Path) -> Command {
        let verbosity = if self.keep_raw { "debug" } else { "quiet" };
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "-v",
            verbosity,
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path);
        cmd
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new(PathBuf::from("ffprobe"), DEFAULT_PROBE_TIMEOUT, false)
    }
}

impl Prober for FfprobeProber {
    fn probe(&self, path: &Path) -> ProbeOutcome {
        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => return ProbeOutcome::Failed(ProbeFailure::from_path(path, e.to_string())),
        };

        let output = match run_command(&mut self.command(path), "ffprobe", Some(self.timeout)) {
            Ok(output) => output,
            Err(e) => {
                warn!("Could not run ffprobe on {}: {e}", path.display());
                return ProbeOutcome::Failed(ProbeFailure::from_path(path, e.to_string()));
            }
        };

        if output.timed_out {
            return ProbeOutcome::Failed(ProbeFailure::from_path(
                path,
                format!("probe timed out after {}s", self.timeout.as_secs()),
            ));
        }
        if !output.success() {
            let reason = match output.exit_code() {
                Some(code) => format!("ffprobe exited with status {code}"),
                None => "ffprobe terminated by signal".to_string(),
            };
            // A failing ffprobe usually explains itself on stderr only.
            let raw = if output.stdout.trim().is_empty() {
                output.stderr
            } else {
                output.stdout
            };
            return ProbeOutcome::Failed(
                ProbeFailure::from_path(path, reason).with_raw_output(self.keep_raw.then_some(raw)),
            );
        }

        match parse_ffprobe_json(path, size, &output.stdout) {
            Ok(mut result) => {
                debug!(
                    "Probed {}: {} / {}",
                    path.display(),
                    result.container,
                    result.video_codec
                );
                if self.keep_raw {
                    result.raw_output = Some(output.stdout);
                }
                ProbeOutcome::Probed(result)
            }
            Err(reason) => ProbeOutcome::Failed(
                ProbeFailure::from_path(path, reason)
                    .with_raw_output(self.keep_raw.then_some(output.stdout)),
            ),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    const VALID_JSON: &str = r#"{"streams":[{"codec_type":"video","codec_name":"huffyuv","width":320,"height":240,"r_frame_rate":"25/1"}],"format":{"format_name":"avi","duration":"1.0"}}"#;

    fn fake_ffprobe(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-ffprobe");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn input(dir: &Path) -> PathBuf {
        let path = dir.join("clip.homohs");
        fs::write(&path, b"RIFF....AVI LIST").unwrap();
        path
    }

    #[test]
    fn test_probe_parses_json_and_keeps_raw() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffprobe(dir.path(), &format!("echo '{VALID_JSON}'"));
        let prober = FfprobeProber::new(program, Duration::from_secs(10), true);

        match prober.probe(&input(dir.path())) {
            ProbeOutcome::Probed(result) => {
                assert_eq!(result.video_codec, "huffyuv");
                assert_eq!(result.container, "AVI");
                assert_eq!(result.size, 16);
                assert!(result.raw_output.unwrap().contains("huffyuv"));
            }
            other => panic!("expected probe result, got {other:?}"),
        }
    }

    #[test]
    fn test_probe_failure_carries_sample() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffprobe(dir.path(), "exit 1");
        let prober = FfprobeProber::new(program, Duration::from_secs(10), false);

        match prober.probe(&input(dir.path())) {
            ProbeOutcome::Failed(failure) => {
                assert!(failure.reason.contains("status 1"));
                assert_eq!(failure.byte_sample, b"RIFF....AVI LIST".to_vec());
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_unparsable_output_is_kept_verbatim_in_debug_mode() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffprobe(dir.path(), "echo '{\"streams\": [garbage'");
        let prober = FfprobeProber::new(program, Duration::from_secs(10), true);

        match prober.probe(&input(dir.path())) {
            ProbeOutcome::Failed(failure) => {
                assert!(failure.reason.contains("unparsable"));
                assert_eq!(failure.raw_output.as_deref(), Some("{\"streams\": [garbage\n"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_probe_keeps_stderr_in_debug_mode() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffprobe(dir.path(), "echo 'Invalid data found' >&2; exit 1");

        let verbose = FfprobeProber::new(program.clone(), Duration::from_secs(10), true);
        match verbose.probe(&input(dir.path())) {
            ProbeOutcome::Failed(failure) => {
                assert!(failure.raw_output.unwrap().contains("Invalid data found"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        let quiet = FfprobeProber::new(program, Duration::from_secs(10), false);
        match quiet.probe(&input(dir.path())) {
            ProbeOutcome::Failed(failure) => assert_eq!(failure.raw_output, None),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_mode_raises_ffprobe_verbosity() {
        let dir = tempfile::tempdir().unwrap();
        let program = PathBuf::from("ffprobe");
        let file = input(dir.path());

        let args = |keep_raw| {
            let prober = FfprobeProber::new(program.clone(), Duration::from_secs(1), keep_raw);
            prober
                .command(&file)
                .get_args()
                .map(|a| a.to_string_lossy().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(&args(true)[..2], ["-v", "debug"]);
        assert_eq!(&args(false)[..2], ["-v", "quiet"]);
    }

    #[test]
    fn test_probe_timeout_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_ffprobe(dir.path(), "exec sleep 30");
        let prober = FfprobeProber::new(program, Duration::from_millis(200), false);

        match prober.probe(&input(dir.path())) {
            ProbeOutcome::Failed(failure) => assert!(failure.reason.contains("timed out")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_ffprobe_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let prober = FfprobeProber::new(
            PathBuf::from("/nonexistent/ffprobe"),
            Duration::from_secs(1),
            false,
        );
        assert!(matches!(
            prober.probe(&input(dir.path())),
            ProbeOutcome::Failed(_)
        ));
    }
}
