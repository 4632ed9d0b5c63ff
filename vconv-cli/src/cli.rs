// ============================================================================
// vconv-cli/src/cli.rs
// ============================================================================
//
// COMMAND-LINE INTERFACE: Argument Definitions
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    DEFAULT_OUTPUT_DIR, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_PROBE_WORKERS, FFMPEG_ENV_VAR,
    FFPROBE_ENV_VAR,
};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "vconv: verified video-to-MP4 conversion",
    long_about = "Probes video files, decides per file between stream copy and re-encode, \
                  converts with ffmpeg and verifies every result with SHA-256 checksums."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Converts a video file, or the videos found under a directory, to MP4
    Convert(ConvertArgs),
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Video file or directory to scan recursively
    #[arg(required = true, value_name = "PATH")]
    pub input_path: PathBuf,

    /// Root of the timestamped output tree
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Keep raw probe output and the full ffmpeg output of every job
    #[arg(long)]
    pub debug: bool,

    /// Convert every readable file without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Number of conversions to run at the same time
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = 1,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Number of files to probe at the same time
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PROBE_WORKERS,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub probe_workers: u16,

    /// Kill a conversion that runs longer than this many seconds
    #[arg(long = "timeout", value_name = "SECS",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Kill an ffprobe call that runs longer than this many seconds
    #[arg(long = "probe-timeout", value_name = "SECS", default_value_t = DEFAULT_PROBE_TIMEOUT_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub probe_timeout_secs: u64,

    /// Skip hardware encoders and always use libx264
    #[arg(long)]
    pub no_hwaccel: bool,

    /// ffmpeg executable to use
    #[arg(long, value_name = "PROGRAM", env = FFMPEG_ENV_VAR, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe executable to use
    #[arg(long, value_name = "PROGRAM", env = FFPROBE_ENV_VAR, default_value = "ffprobe")]
    pub ffprobe: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert_defaults() {
        let cli = Cli::parse_from(["vconv", "convert", "videos"]);
        let Commands::Convert(args) = cli.command;

        assert_eq!(args.input_path, PathBuf::from("videos"));
        assert_eq!(args.output_dir, PathBuf::from("converted_videos"));
        assert!(!args.debug);
        assert!(!args.yes);
        assert_eq!(args.jobs, 1);
        assert_eq!(args.probe_workers, DEFAULT_PROBE_WORKERS);
        assert!(args.timeout_secs.is_none());
        assert_eq!(args.probe_timeout_secs, DEFAULT_PROBE_TIMEOUT_SECS);
        assert!(!args.no_hwaccel);
    }

    #[test]
    fn test_parse_convert_with_options() {
        let cli = Cli::parse_from([
            "vconv",
            "convert",
            "clip.homohs",
            "-o",
            "out",
            "--debug",
            "--yes",
            "--jobs",
            "3",
            "--probe-workers",
            "8",
            "--timeout",
            "600",
            "--probe-timeout",
            "5",
            "--no-hwaccel",
            "--ffmpeg",
            "/opt/ffmpeg/bin/ffmpeg",
        ]);
        let Commands::Convert(args) = cli.command;

        assert_eq!(args.input_path, PathBuf::from("clip.homohs"));
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert!(args.debug);
        assert!(args.yes);
        assert_eq!(args.jobs, 3);
        assert_eq!(args.probe_workers, 8);
        assert_eq!(args.timeout_secs, Some(600));
        assert_eq!(args.probe_timeout_secs, 5);
        assert!(args.no_hwaccel);
        assert_eq!(args.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let result = Cli::try_parse_from(["vconv", "convert", "videos", "--jobs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_input_path_required() {
        assert!(Cli::try_parse_from(["vconv", "convert"]).is_err());
    }
}
