//! Implementation of the 'convert' subcommand.
//!
//! Maps the arguments onto a `CoreConfig`, checks the environment, wires the
//! production ffprobe/ffmpeg implementations into the core and reports the
//! run summary.

use crate::cli::ConvertArgs;
use crate::error::{CliErrorContext, CliResult};

use vconv_core::external::{FfmpegTranscoder, FfprobeProber};
use vconv_core::hardware_accel::FfmpegCapabilityProbe;
use vconv_core::{
    CoreConfig, CoreError, CoreResult, MediaProfile, RunDependencies, RunObserver,
    SelectionState, check_environment, process_input, prompt_selection, terminal,
};

use indicatif::ProgressBar;
use log::{debug, info, warn};

use std::io;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Creates and validates the core configuration from CLI arguments.
pub fn create_core_config(args: &ConvertArgs) -> CliResult<CoreConfig> {
    let mut config = CoreConfig::new(args.output_dir.clone());
    config.ffmpeg_program = args.ffmpeg.clone();
    config.ffprobe_program = args.ffprobe.clone();
    config.debug = args.debug;
    config.disable_hwaccel = args.no_hwaccel;
    config.max_concurrent_jobs = usize::from(args.jobs);
    config.probe_workers = usize::from(args.probe_workers);
    config.probe_timeout = Duration::from_secs(args.probe_timeout_secs);
    config.conversion_timeout = args.timeout_secs.map(Duration::from_secs);

    config.validate()?;
    Ok(config)
}

/// Observer that drives the probe progress bar and the selection prompt.
struct TerminalObserver {
    progress: ProgressBar,
    assume_yes: bool,
}

impl RunObserver for TerminalObserver {
    fn files_discovered(&self, count: usize) {
        self.progress.set_length(count as u64);
    }

    fn file_classified(&self, profile: &MediaProfile) {
        self.progress.set_message(profile.file_name());
        self.progress.inc(1);
    }

    fn files_classified(&self, profiles: &[MediaProfile]) {
        self.progress.finish_and_clear();
        if !profiles.is_empty() {
            terminal::print_file_table(profiles);
        }
    }

    fn select(&self, profiles: &[MediaProfile]) -> CoreResult<SelectionState> {
        if self.assume_yes {
            info!("Converting all readable files (--yes)");
            return Ok(SelectionState::ConvertAll);
        }
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        prompt_selection(&mut stdin.lock(), &mut stdout, profiles)
    }
}

/// Sets the cancel flag on the first Ctrl+C and exits on the second.
fn install_cancel_handler(cancel: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        if cancel.swap(true, Ordering::SeqCst) {
            process::exit(130);
        }
        warn!("Interrupted: running conversions will finish, no new ones will start");
    });
    if let Err(e) = result {
        warn!("Could not install Ctrl+C handler: {e}");
    }
}

fn display_run_info(args: &ConvertArgs, log_path: &Path) {
    terminal::print_section("vconv");
    terminal::print_status("Input", &args.input_path.display().to_string(), false);
    terminal::print_status("Output root", &args.output_dir.display().to_string(), false);
    terminal::print_status("Run log", &log_path.display().to_string(), false);
    if args.no_hwaccel {
        terminal::print_status("Encoder", "software only (--no-hwaccel)", false);
    }
}

/// Runs the convert command and returns the process exit code.
pub fn run_convert(args: ConvertArgs, log_path: &Path) -> CliResult<i32> {
    let started = Instant::now();
    display_run_info(&args, log_path);

    if !args.input_path.exists() {
        return Err(CoreError::PathError(format!(
            "Input path '{}' does not exist",
            args.input_path.display()
        )));
    }

    let config = create_core_config(&args)?;
    debug!("Configuration: {config:?}");

    check_environment(&config).cli_context("Environment check failed")?;
    terminal::print_success("ffmpeg and ffprobe found");

    let prober = FfprobeProber::new(config.ffprobe_program.clone(), config.probe_timeout, config.debug);
    let transcoder = FfmpegTranscoder::new(config.ffmpeg_program.clone());
    let capability_probe =
        FfmpegCapabilityProbe::new(config.ffmpeg_program.clone(), config.capability_probe_timeout);
    let deps = RunDependencies {
        prober: &prober,
        transcoder: &transcoder,
        capability_probe: &capability_probe,
    };

    let cancel = Arc::new(AtomicBool::new(false));
    install_cancel_handler(Arc::clone(&cancel));

    let observer = TerminalObserver {
        progress: terminal::probe_progress_bar(0),
        assume_yes: args.yes,
    };

    let summary = process_input(&config, &args.input_path, &deps, &observer, &cancel)?;

    if summary.quit {
        info!("Quit without converting anything");
    }
    terminal::print_summary(&summary);
    terminal::print_status(
        "Total time",
        &vconv_core::format_duration(started.elapsed().as_secs_f64()),
        true,
    );

    Ok(summary.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> ConvertArgs {
        let Commands::Convert(args) = Cli::parse_from(args.iter().copied()).command;
        args
    }

    #[test]
    fn test_core_config_from_args() {
        let args = parse(&[
            "vconv", "convert", "in", "-o", "out", "--jobs", "2", "--timeout", "90",
            "--no-hwaccel", "--debug",
        ]);
        let config = create_core_config(&args).unwrap();
        assert_eq!(config.output_root, Path::new("out"));
        assert_eq!(config.max_concurrent_jobs, 2);
        assert_eq!(config.conversion_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.probe_timeout, Duration::from_secs(30));
        assert!(config.disable_hwaccel);
        assert!(config.debug);
    }

    #[test]
    fn test_default_has_no_conversion_timeout() {
        let config = create_core_config(&parse(&["vconv", "convert", "in"])).unwrap();
        assert!(config.conversion_timeout.is_none());
        assert_eq!(config.max_concurrent_jobs, 1);
        assert_eq!(config.high_quality_crf, 17);
    }
}
