// ============================================================================
// vconv-core/src/media/classify.rs
// ============================================================================
//
// CLASSIFICATION: Probe Outcome -> MediaProfile
//
// A pure mapping with no I/O. Readability is modelled as an enum whose Valid
// variant owns the stream details and whose Unreadable variant owns the byte
// sample, so an unreadable profile cannot carry codec data.

use crate::media::probe::ProbeOutcome;

use std::path::{Path, PathBuf};

/// Codecs treated as lossless or near-lossless sources (lowercase ffprobe names).
pub const LOSSLESS_CODECS: &[&str] = &[
    "huffyuv", "ffvhuff", "ffv1", "v210", "rawvideo", "utvideo", "magicyuv", "r210",
];

/// Whether a codec preserves every source sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecClass {
    Lossless,
    Lossy,
}

impl CodecClass {
    /// Classifies a codec name. Anything not positively identified is lossy.
    #[must_use]
    pub fn of(codec: &str) -> Self {
        if LOSSLESS_CODECS.iter().any(|c| codec.eq_ignore_ascii_case(c)) {
            CodecClass::Lossless
        } else {
            CodecClass::Lossy
        }
    }
}

/// Details of a file that probed as video.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub container: String,
    pub video_codec: String,
    pub codec_class: CodecClass,
    pub audio_codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<String>,
    pub duration_secs: Option<f64>,
    pub bit_rate: Option<u64>,
    pub raw_probe: Option<String>,
}

/// Details of a file that could not be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableInfo {
    pub reason: String,
    pub byte_sample: Vec<u8>,
    pub raw_probe: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Readability {
    Valid(StreamInfo),
    Unreadable(UnreadableInfo),
}

/// Classified view of one discovered file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProfile {
    pub path: PathBuf,
    pub size: u64,
    pub readability: Readability,
}

impl MediaProfile {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self.readability, Readability::Valid(_))
    }

    #[must_use]
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        match &self.readability {
            Readability::Valid(info) => Some(info),
            Readability::Unreadable(_) => None,
        }
    }

    #[must_use]
    pub fn container(&self) -> Option<&str> {
        self.stream_info().map(|i| i.container.as_str())
    }

    #[must_use]
    pub fn video_codec(&self) -> Option<&str> {
        self.stream_info().map(|i| i.video_codec.as_str())
    }

    #[must_use]
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.stream_info().and_then(|i| i.width.zip(i.height))
    }

    #[must_use]
    pub fn frame_rate(&self) -> Option<&str> {
        self.stream_info().and_then(|i| i.frame_rate.as_deref())
    }

    #[must_use]
    pub fn is_lossless(&self) -> bool {
        self.stream_info()
            .is_some_and(|i| i.codec_class == CodecClass::Lossless)
    }

    #[must_use]
    pub fn byte_sample(&self) -> Option<&[u8]> {
        match &self.readability {
            Readability::Unreadable(info) => Some(&info.byte_sample),
            Readability::Valid(_) => None,
        }
    }

    /// Raw inspection output, present for readable and unreadable files alike.
    #[must_use]
    pub fn raw_probe(&self) -> Option<&str> {
        match &self.readability {
            Readability::Valid(info) => info.raw_probe.as_deref(),
            Readability::Unreadable(info) => info.raw_probe.as_deref(),
        }
    }

    #[must_use]
    pub fn audio_codec(&self) -> Option<&str> {
        self.stream_info().and_then(|i| i.audio_codec.as_deref())
    }

    #[must_use]
    pub fn duration_secs(&self) -> Option<f64> {
        self.stream_info().and_then(|i| i.duration_secs)
    }

    #[must_use]
    pub fn bit_rate(&self) -> Option<u64> {
        self.stream_info().and_then(|i| i.bit_rate)
    }

    /// File name for display; falls back to the full path.
    #[must_use]
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

/// Turns a probe outcome into a [`MediaProfile`].
#[must_use]
pub fn classify(outcome: ProbeOutcome) -> MediaProfile {
    match outcome {
        ProbeOutcome::Probed(result) => {
            let codec_class = CodecClass::of(&result.video_codec);
            MediaProfile {
                path: result.path,
                size: result.size,
                readability: Readability::Valid(StreamInfo {
                    container: result.container,
                    video_codec: result.video_codec,
                    codec_class,
                    audio_codec: result.audio_codec,
                    width: result.width,
                    height: result.height,
                    frame_rate: result.frame_rate,
                    duration_secs: result.duration_secs,
                    bit_rate: result.bit_rate,
                    raw_probe: result.raw_output,
                }),
            }
        }
        ProbeOutcome::Failed(failure) => MediaProfile {
            path: failure.path,
            size: failure.size,
            readability: Readability::Unreadable(UnreadableInfo {
                reason: failure.reason,
                byte_sample: failure.byte_sample,
                raw_probe: failure.raw_output,
            }),
        },
    }
}
