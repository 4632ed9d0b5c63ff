//! Core library for verified video-to-MP4 conversion using ffmpeg and ffprobe.
//!
//! This crate discovers candidate files, probes and classifies them (including
//! files that turn out not to be video at all), decides per file whether the
//! video stream can be copied or must be re-encoded, picks a hardware encoder
//! with software fallback, runs ffmpeg into a temporary file, verifies the
//! result with SHA-256 checksums and writes an append-only audit trail.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vconv_core::{CoreConfig, CoreResult, MediaProfile, RunDependencies, RunObserver, SelectionState};
//! use vconv_core::external::{FfmpegTranscoder, FfprobeProber};
//! use vconv_core::hardware_accel::FfmpegCapabilityProbe;
//! use std::path::{Path, PathBuf};
//! use std::sync::atomic::AtomicBool;
//!
//! struct ConvertEverything;
//!
//! impl RunObserver for ConvertEverything {
//!     fn select(&self, _profiles: &[MediaProfile]) -> CoreResult<SelectionState> {
//!         Ok(SelectionState::ConvertAll)
//!     }
//! }
//!
//! let config = CoreConfig::new(PathBuf::from("converted_videos"));
//! vconv_core::check_environment(&config).unwrap();
//!
//! let prober = FfprobeProber::new(config.ffprobe_program.clone(), config.probe_timeout, false);
//! let transcoder = FfmpegTranscoder::new(config.ffmpeg_program.clone());
//! let capability_probe = FfmpegCapabilityProbe::new(
//!     config.ffmpeg_program.clone(),
//!     config.capability_probe_timeout,
//! );
//! let deps = RunDependencies {
//!     prober: &prober,
//!     transcoder: &transcoder,
//!     capability_probe: &capability_probe,
//! };
//!
//! let summary = vconv_core::process_input(
//!     &config,
//!     Path::new("/path/to/videos"),
//!     &deps,
//!     &ConvertEverything,
//!     &AtomicBool::new(false),
//! )
//! .unwrap();
//! std::process::exit(summary.exit_code());
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod hardware_accel;
pub mod media;
pub mod orchestrator;
pub mod planning;
pub mod processing;
pub mod selection;
pub mod temp_files;
pub mod terminal;
pub mod util;
pub mod utils;

// Re-exports for public API
pub use config::CoreConfig;
pub use discovery::find_candidate_files;
pub use error::{CoreError, CoreResult};
pub use hardware_accel::{CapabilityProbe, EncoderBackend};
pub use media::{MediaProfile, ProbeOutcome, Prober, Readability, classify};
pub use orchestrator::{
    JobReport, JobStatus, RunDependencies, RunObserver, RunSummary, UnreadableReport,
    check_environment, classify_all, process_input, run_batch,
};
pub use planning::{AudioHandling, EncodingPlan, PlannerSettings, Strategy, plan};
pub use processing::{ConversionJob, ExecutionOutcome, RunLayout, VerificationResult, verify};
pub use selection::{SelectionState, prompt_selection, transition};
pub use utils::{format_bytes, format_duration, hex_preview};
