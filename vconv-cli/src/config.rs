// vconv-cli/src/config.rs
//
// Defines default configuration constants for the `vconv-cli` application.

pub use vconv_core::config::DEFAULT_OUTPUT_DIR;

/// Default number of parallel ffprobe calls.
pub const DEFAULT_PROBE_WORKERS: u16 = vconv_core::config::DEFAULT_PROBE_WORKERS as u16;

/// Default ffprobe timeout, in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = vconv_core::config::DEFAULT_PROBE_TIMEOUT.as_secs();

/// Directory under the output root holding the run logs.
pub const LOG_DIR_NAME: &str = "logs";

/// Overrides the console log level (e.g. `VCONV_LOG=debug`).
pub const LOG_ENV_VAR: &str = "VCONV_LOG";

pub const FFMPEG_ENV_VAR: &str = "VCONV_FFMPEG";
pub const FFPROBE_ENV_VAR: &str = "VCONV_FFPROBE";
