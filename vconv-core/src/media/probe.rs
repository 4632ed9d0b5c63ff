// ============================================================================
// vconv-core/src/media/probe.rs
// ============================================================================
//
// PROBING: Media Inspection Results and the Prober Seam
//
// Probing never fails with an error: a file that cannot be inspected yields a
// ProbeFailure carrying the reason and the first bytes of the file, so that
// the caller can report it and move on.
//
// KEY COMPONENTS:
// - Prober: Trait implemented by the ffprobe executor and by test fakes
// - ProbeOutcome / ProbeResult / ProbeFailure: Probe output
// - parse_ffprobe_json: ffprobe JSON -> ProbeResult fields

use crate::config::BYTE_SAMPLE_LEN;

use log::debug;
use serde::Deserialize;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Capability to inspect a media file.
///
/// Implementations must be shareable across probe worker threads.
pub trait Prober: Sync {
    fn probe(&self, path: &Path) -> ProbeOutcome;
}

/// Stream and container details extracted from a successful probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub path: PathBuf,
    pub size: u64,
    /// First entry of the container list, upper-cased (e.g. "MOV", "AVI")
    pub container: String,
    /// Codec of the first video stream, lower-cased (e.g. "h264", "huffyuv")
    pub video_codec: String,
    pub audio_codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Rational frame rate as reported (e.g. "30000/1001")
    pub frame_rate: Option<String>,
    pub duration_secs: Option<f64>,
    pub bit_rate: Option<u64>,
    /// Raw inspection output, only kept in debug mode
    pub raw_output: Option<String>,
}

/// A file that could not be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub path: PathBuf,
    pub size: u64,
    pub reason: String,
    /// Leading bytes of the file
    pub byte_sample: Vec<u8>,
    /// Whatever the inspection tool printed, only kept in debug mode
    pub raw_output: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Probed(ProbeResult),
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ProbeOutcome::Probed(result) => &result.path,
            ProbeOutcome::Failed(failure) => &failure.path,
        }
    }
}

impl ProbeFailure {
    /// Builds a failure for `path`, reading its size and leading bytes.
    pub fn from_path(path: &Path, reason: impl Into<String>) -> Self {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Self {
            path: path.to_path_buf(),
            size,
            reason: reason.into(),
            byte_sample: read_byte_sample(path, BYTE_SAMPLE_LEN),
            raw_output: None,
        }
    }

    /// Attaches the inspection tool's output.
    #[must_use]
    pub fn with_raw_output(mut self, raw_output: Option<String>) -> Self {
        self.raw_output = raw_output;
        self
    }
}

/// Reads up to `len` leading bytes of `path`. Returns an empty sample if the file cannot be read.
#[must_use]
pub fn read_byte_sample(path: &Path, len: usize) -> Vec<u8> {
    let mut sample = Vec::with_capacity(len);
    match File::open(path) {
        Ok(file) => {
            if let Err(e) = file.take(len as u64).read_to_end(&mut sample) {
                debug!("Failed to read byte sample from {}: {e}", path.display());
            }
        }
        Err(e) => debug!("Failed to open {} for byte sample: {e}", path.display()),
    }
    sample
}

// ============================================================================
// FFPROBE JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

/// Parses `ffprobe -print_format json -show_format -show_streams` output.
///
/// Returns the reason as an error when the output is not JSON or describes
/// no video stream.
pub fn parse_ffprobe_json(path: &Path, size: u64, json: &str) -> Result<ProbeResult, String> {
    let parsed: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("unparsable probe output: {e}"))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| "no video stream found".to_string())?;
    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let container = parsed
        .format
        .as_ref()
        .and_then(|f| f.format_name.as_deref())
        .and_then(|name| name.split(',').next())
        .filter(|name| !name.is_empty())
        .map_or_else(|| "UNKNOWN".to_string(), str::to_uppercase);

    let video_codec = video
        .codec_name
        .as_deref()
        .map_or_else(|| "unknown".to_string(), str::to_lowercase);

    let frame_rate = video
        .r_frame_rate
        .as_deref()
        .filter(|rate| !rate.is_empty() && !rate.starts_with("0/"))
        .map(str::to_string);

    Ok(ProbeResult {
        path: path.to_path_buf(),
        size,
        container,
        video_codec,
        audio_codec: audio
            .and_then(|a| a.codec_name.as_deref())
            .map(str::to_lowercase),
        width: video.width.and_then(|w| u32::try_from(w).ok()),
        height: video.height.and_then(|h| u32::try_from(h).ok()),
        frame_rate,
        duration_secs: parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok()),
        bit_rate: parsed
            .format
            .as_ref()
            .and_then(|f| f.bit_rate.as_deref())
            .and_then(|b| b.parse::<u64>().ok()),
        raw_output: None,
    })
}
