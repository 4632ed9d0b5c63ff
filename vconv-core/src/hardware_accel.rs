// ============================================================================
// vconv-core/src/hardware_accel.rs
// ============================================================================
//
// HARDWARE ACCELERATION: Encoder Backend Selection with Software Fallback
//
// This module decides which H.264 encoder a run uses. The candidate list is
// host-specific and always ends with the software encoder, which is assumed
// to be present and is never probed. Every other candidate is checked with a
// tiny test encode; the first one that works wins.
//
// KEY COMPONENTS:
// - EncoderBackend: Encoder identity plus its ffmpeg flags
// - CapabilityProbe: Trait answering "does this backend work here?"
// - FfmpegCapabilityProbe: Test-encode probe built on ffmpeg-sidecar
// - select: First usable candidate, falling back to software

use crate::util::command::wait_with_timeout;

use ffmpeg_sidecar::command::FfmpegCommand;
use log::{debug, info};

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Render node used for VAAPI encoding.
pub const VAAPI_DEVICE: &str = "/dev/dri/renderD128";

/// Upper bound of the x264 CRF scale.
pub const MAX_CRF: u8 = 51;

/// Test frame size; some NVENC generations reject very small frames.
const PROBE_FRAME_SIZE: &str = "256x256";

/// An H.264 encoder implementation ffmpeg can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderBackend {
    VideoToolbox,
    Nvenc,
    Qsv,
    Vaapi,
    Software,
}

impl EncoderBackend {
    /// Name of the ffmpeg encoder for `-c:v`.
    #[must_use]
    pub fn encoder_name(self) -> &'static str {
        match self {
            EncoderBackend::VideoToolbox => "h264_videotoolbox",
            EncoderBackend::Nvenc => "h264_nvenc",
            EncoderBackend::Qsv => "h264_qsv",
            EncoderBackend::Vaapi => "h264_vaapi",
            EncoderBackend::Software => "libx264",
        }
    }

    /// Short identifier used in logs and audit records.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            EncoderBackend::VideoToolbox => "videotoolbox",
            EncoderBackend::Nvenc => "nvenc",
            EncoderBackend::Qsv => "qsv",
            EncoderBackend::Vaapi => "vaapi",
            EncoderBackend::Software => "software",
        }
    }

    /// Flag through which the encoder receives its quality value.
    #[must_use]
    pub fn quality_flag(self) -> &'static str {
        match self {
            EncoderBackend::VideoToolbox => "-q:v",
            EncoderBackend::Nvenc => "-cq",
            EncoderBackend::Qsv => "-global_quality",
            EncoderBackend::Vaapi => "-qp",
            EncoderBackend::Software => "-crf",
        }
    }

    /// Value passed through [`quality_flag`](Self::quality_flag) for a CRF.
    ///
    /// NVENC, QSV and VAAPI share the CRF direction (lower is better) and
    /// take the value as is. VideoToolbox's `-q:v` runs 1..=100 with higher
    /// being better, so the CRF range 0..=51 is inverted onto it.
    #[must_use]
    pub fn quality_value(self, crf: u8) -> u8 {
        let crf = crf.min(MAX_CRF);
        match self {
            EncoderBackend::VideoToolbox => {
                let scaled = u16::from(MAX_CRF - crf) * 100 / u16::from(MAX_CRF);
                u8::try_from(scaled).unwrap_or(100).max(1)
            }
            EncoderBackend::Qsv => crf.max(1),
            EncoderBackend::Nvenc | EncoderBackend::Vaapi | EncoderBackend::Software => crf,
        }
    }

    #[must_use]
    pub fn is_hardware(self) -> bool {
        self != EncoderBackend::Software
    }

    /// Arguments that must precede `-i` for this backend.
    #[must_use]
    pub fn input_args(self) -> Vec<String> {
        match self {
            EncoderBackend::Vaapi => vec!["-vaapi_device".to_string(), VAAPI_DEVICE.to_string()],
            _ => Vec::new(),
        }
    }

    /// Video filter the backend needs for upload, if any.
    #[must_use]
    pub fn upload_filter(self) -> Option<&'static str> {
        match self {
            EncoderBackend::Vaapi => Some("format=nv12,hwupload"),
            _ => None,
        }
    }
}

impl fmt::Display for EncoderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.encoder_name())
    }
}

/// Candidate backends for an operating system, in preference order.
#[must_use]
pub fn candidates_for_os(os: &str, disable_hwaccel: bool) -> Vec<EncoderBackend> {
    if disable_hwaccel {
        return vec![EncoderBackend::Software];
    }
    match os {
        "macos" => vec![EncoderBackend::VideoToolbox, EncoderBackend::Software],
        _ => vec![
            EncoderBackend::Nvenc,
            EncoderBackend::Qsv,
            EncoderBackend::Vaapi,
            EncoderBackend::Software,
        ],
    }
}

/// Candidate backends for the current host.
#[must_use]
pub fn host_candidates(disable_hwaccel: bool) -> Vec<EncoderBackend> {
    candidates_for_os(env::consts::OS, disable_hwaccel)
}

/// Answers whether a backend can actually encode on this host.
pub trait CapabilityProbe: Sync {
    fn is_usable(&self, backend: EncoderBackend) -> bool;
}

/// Returns the first usable candidate.
///
/// The software backend is returned without consulting `probe`, and is also
/// the result when every candidate fails or the list is empty.
pub fn select(candidates: &[EncoderBackend], probe: &dyn CapabilityProbe) -> EncoderBackend {
    for &backend in candidates {
        if backend == EncoderBackend::Software {
            break;
        }
        if probe.is_usable(backend) {
            info!("Using hardware encoder {backend}");
            return backend;
        }
        debug!("Encoder backend {backend} is not usable on this host");
    }
    info!("Using software encoder {}", EncoderBackend::Software);
    EncoderBackend::Software
}

/// Probes a backend by encoding a fraction of a second of black frames.
#[derive(Debug, Clone)]
pub struct FfmpegCapabilityProbe {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegCapabilityProbe {
    #[must_use]
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    fn test_encode_args(backend: EncoderBackend) -> Vec<String> {
        let mut args = vec!["-nostdin".to_string()];
        args.extend(backend.input_args());
        args.extend(["-f".to_string(), "lavfi".to_string(), "-i".to_string()]);
        args.push(format!("color=black:s={PROBE_FRAME_SIZE}:d=0.1"));
        if let Some(filter) = backend.upload_filter() {
            args.push("-vf".to_string());
            args.push(filter.to_string());
        }
        args.extend(
            ["-c:v", backend.encoder_name(), "-f", "null", "-"]
                .iter()
                .map(|s| (*s).to_string()),
        );
        args
    }
}

impl CapabilityProbe for FfmpegCapabilityProbe {
    fn is_usable(&self, backend: EncoderBackend) -> bool {
        let label = format!("capability probe ({})", backend.id());
        let mut cmd = FfmpegCommand::new_with_path(&self.program);
        cmd.args(Self::test_encode_args(backend));

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!("Failed to start {label}: {e}");
                return false;
            }
        };

        match wait_with_timeout(child.as_inner_mut(), &label, Some(self.timeout)) {
            Ok(output) if output.success() => true,
            Ok(output) => {
                debug!(
                    "{label} failed (exit: {:?}, timed out: {}): {}",
                    output.exit_code(),
                    output.timed_out,
                    output.stderr.lines().last().unwrap_or_default()
                );
                false
            }
            Err(e) => {
                debug!("{label} could not be run: {e}");
                false
            }
        }
    }
}
