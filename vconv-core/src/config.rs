// ============================================================================
// vconv-core/src/config.rs
// ============================================================================
//
// CONFIGURATION: Core Configuration Structures and Constants
//
// This module defines the configuration used throughout the vconv-core
// library: where output goes, how long external processes may run, how much
// parallelism to use, and the quality values fed to the encoding planner.
//
// KEY COMPONENTS:
// - CoreConfig: Main configuration structure for the library
// - Default constants: Predefined values for common settings
//
// USAGE:
// Instances of CoreConfig are created by consumers of the library (like
// vconv-cli) and passed to the orchestrator.

use crate::error::{CoreError, CoreResult};

use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Default root of the output tree.
pub const DEFAULT_OUTPUT_DIR: &str = "converted_videos";

/// CRF used when re-encoding lossless/near-lossless sources.
/// Lower values produce higher quality but larger files.
pub const DEFAULT_HIGH_QUALITY_CRF: u8 = 17;

/// CRF used for every other re-encode.
pub const DEFAULT_STANDARD_CRF: u8 = 23;

/// Upper bound accepted for CRF values (libx264 scale).
pub const MAX_CRF: u8 = 51;

/// Extension of the target container.
pub const TARGET_EXTENSION: &str = "mp4";

/// Number of leading bytes captured for files that cannot be probed.
pub const BYTE_SAMPLE_LEN: usize = 16;

/// Default bound on a single ffprobe invocation.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a single hardware capability probe.
pub const DEFAULT_CAPABILITY_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of files probed in parallel.
pub const DEFAULT_PROBE_WORKERS: usize = 4;

/// Default number of conversions run in parallel.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 1;

// ============================================================================
// CORE CONFIGURATION
// ============================================================================

/// Main configuration structure for the vconv-core library.
///
/// # Examples
///
/// ```rust
/// use vconv_core::CoreConfig;
/// use std::path::PathBuf;
///
/// let mut config = CoreConfig::new(PathBuf::from("converted_videos"));
/// config.debug = true;
/// config.max_concurrent_jobs = 2;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    // ---- Path Configuration ----

    /// Root of the timestamp-partitioned output tree
    pub output_root: PathBuf,

    /// Program used for conversions
    pub ffmpeg_program: PathBuf,

    /// Program used for media inspection
    pub ffprobe_program: PathBuf,

    // ---- Encoder Settings ----

    /// CRF for lossless sources
    pub high_quality_crf: u8,

    /// CRF for all other re-encodes
    pub standard_crf: u8,

    /// Restrict encoder selection to the software backend
    pub disable_hwaccel: bool,

    // ---- Process Limits ----

    /// Timeout for each ffprobe call
    pub probe_timeout: Duration,

    /// Timeout for each conversion; `None` lets ffmpeg run to completion
    pub conversion_timeout: Option<Duration>,

    /// Timeout for each hardware capability probe
    pub capability_probe_timeout: Duration,

    /// Worker limit for parallel probing
    pub probe_workers: usize,

    /// Concurrency limit for conversion jobs
    pub max_concurrent_jobs: usize,

    // ---- Diagnostics ----

    /// Persist raw probe output and full process output
    pub debug: bool,
}

impl CoreConfig {
    /// Creates a configuration with default settings rooted at `output_root`.
    #[must_use]
    pub fn new(output_root: PathBuf) -> Self {
        Self {
            output_root,
            ffmpeg_program: PathBuf::from("ffmpeg"),
            ffprobe_program: PathBuf::from("ffprobe"),
            high_quality_crf: DEFAULT_HIGH_QUALITY_CRF,
            standard_crf: DEFAULT_STANDARD_CRF,
            disable_hwaccel: false,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            conversion_timeout: None,
            capability_probe_timeout: DEFAULT_CAPABILITY_PROBE_TIMEOUT,
            probe_workers: DEFAULT_PROBE_WORKERS,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            debug: false,
        }
    }

    /// Checks that the configuration values are usable.
    pub fn validate(&self) -> CoreResult<()> {
        if self.output_root.as_os_str().is_empty() {
            return Err(CoreError::Config("output root must not be empty".to_string()));
        }
        for (name, crf) in [
            ("high quality CRF", self.high_quality_crf),
            ("standard CRF", self.standard_crf),
        ] {
            if crf > MAX_CRF {
                return Err(CoreError::Config(format!(
                    "{name} {crf} is out of range (0-{MAX_CRF})"
                )));
            }
        }
        if self.probe_workers == 0 {
            return Err(CoreError::Config("probe workers must be at least 1".to_string()));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(CoreError::Config(
                "concurrent jobs must be at least 1".to_string(),
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(CoreError::Config("probe timeout must be positive".to_string()));
        }
        if self.conversion_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::Config(
                "conversion timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::new(PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert!(config.validate().is_ok());
        assert_eq!(config.high_quality_crf, 17);
        assert_eq!(config.standard_crf, 23);
        assert!(config.conversion_timeout.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_crf() {
        let mut config = CoreConfig::new(PathBuf::from("out"));
        config.standard_crf = 60;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let mut config = CoreConfig::new(PathBuf::from("out"));
        config.max_concurrent_jobs = 0;
        assert!(config.validate().is_err());

        let mut config = CoreConfig::new(PathBuf::from("out"));
        config.probe_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = CoreConfig::new(PathBuf::from("out"));
        config.conversion_timeout = Some(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
