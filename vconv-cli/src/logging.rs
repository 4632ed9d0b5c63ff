// ============================================================================
// vconv-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and Run Log File
//
// Every message goes to two places: the console, as plain text (warnings and
// errors on stderr), and a per-run log file under `<output>/logs` with
// timestamps and levels. The core library only talks to the `log` facade.
//
// USAGE:
// - Default console level is info, debug with `--debug`
// - VCONV_LOG=<level> overrides the console level (e.g. VCONV_LOG=trace)

use crate::config::{LOG_DIR_NAME, LOG_ENV_VAR};
use crate::error::{CliErrorContext, CliResult};

use log::{Level, LevelFilter};
use vconv_core::CoreError;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the run log for a run started at `timestamp`.
#[must_use]
pub fn log_file_path(output_root: &Path, timestamp: &str) -> PathBuf {
    output_root
        .join(LOG_DIR_NAME)
        .join(format!("vconv_run_{timestamp}.log"))
}

/// Console level from the debug flag and an optional override value.
///
/// An override that is not a level name is ignored.
#[must_use]
pub fn console_level(debug: bool, env_override: Option<&str>) -> LevelFilter {
    env_override
        .and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or(if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
}

/// Installs the global logger. Returns the path of the run log file.
pub fn init_logging(output_root: &Path, debug: bool) -> CliResult<PathBuf> {
    let log_path = log_file_path(output_root, &get_timestamp());
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)
            .cli_with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
    }
    let log_file = fern::log_file(&log_path)
        .cli_with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    let env_level = std::env::var(LOG_ENV_VAR).ok();
    let console = fern::Dispatch::new()
        .format(|out, message, record| match record.level() {
            Level::Error => out.finish(format_args!("Error: {message}")),
            Level::Warn => out.finish(format_args!("Warning: {message}")),
            _ => out.finish(format_args!("{message}")),
        })
        .level(console_level(debug, env_level.as_deref()))
        .chain(
            fern::Dispatch::new()
                .filter(|meta| meta.level() > Level::Warn)
                .chain(std::io::stdout()),
        )
        .chain(
            fern::Dispatch::new()
                .level(LevelFilter::Warn)
                .chain(std::io::stderr()),
        );

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                console::strip_ansi_codes(&message.to_string())
            ));
        })
        .level(if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level_for("ffmpeg_sidecar", LevelFilter::Warn)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| CoreError::OperationFailed(format!("Failed to initialize logging: {e}")))?;

    Ok(log_path)
}
