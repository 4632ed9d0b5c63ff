// ============================================================================
// vconv-core/src/planning.rs
// ============================================================================
//
// ENCODING DECISIONS: MediaProfile -> EncodingPlan
//
// The planner is a pure decision table. The first matching rule wins:
//
// 1. h264 in a MOV/MP4 container   -> StreamCopy
// 2. lossless source codec         -> HighQualityReencode (high quality CRF)
// 3. anything else                 -> StandardReencode (standard CRF)
//
// Resolution and frame rate are informational and never change the outcome.

use crate::config::{CoreConfig, DEFAULT_HIGH_QUALITY_CRF, DEFAULT_STANDARD_CRF};
use crate::error::{CoreError, CoreResult};
use crate::hardware_accel::EncoderBackend;
use crate::media::{CodecClass, MediaProfile};

use std::fmt;

/// Source codecs that MP4 players accept as-is.
pub const WEB_COMPATIBLE_CODECS: &[&str] = &["h264"];

/// Container names (first ffprobe `format_name` entry) that need no remux to MP4.
pub const TARGET_COMPATIBLE_CONTAINERS: &[&str] = &["MOV", "MP4"];

/// How the video stream is produced.
///
/// Only the re-encode variants carry a quality value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    StreamCopy,
    HighQualityReencode { crf: u8 },
    StandardReencode { crf: u8 },
}

impl Strategy {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::StreamCopy => "StreamCopy",
            Strategy::HighQualityReencode { .. } => "HighQualityReencode",
            Strategy::StandardReencode { .. } => "StandardReencode",
        }
    }

    #[must_use]
    pub fn crf(&self) -> Option<u8> {
        match *self {
            Strategy::StreamCopy => None,
            Strategy::HighQualityReencode { crf } | Strategy::StandardReencode { crf } => Some(crf),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.crf() {
            Some(crf) => write!(f, "{} (crf {crf})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioHandling {
    /// Re-encode to AAC
    Aac,
    /// Keep the source audio stream
    Copy,
    /// Source has no audio; emit none
    None,
}

/// Conversion decision for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingPlan {
    pub strategy: Strategy,
    /// Encoder requested for re-encodes
    pub backend: EncoderBackend,
    pub audio: AudioHandling,
}

impl EncodingPlan {
    /// Encoder identifier as recorded in the audit log.
    #[must_use]
    pub fn encoder_label(&self) -> &'static str {
        match self.strategy {
            Strategy::StreamCopy => "copy",
            _ => self.backend.id(),
        }
    }
}

/// Inputs the planner needs beyond the profile itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    pub high_quality_crf: u8,
    pub standard_crf: u8,
    pub backend: EncoderBackend,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            high_quality_crf: DEFAULT_HIGH_QUALITY_CRF,
            standard_crf: DEFAULT_STANDARD_CRF,
            backend: EncoderBackend::Software,
        }
    }
}

impl PlannerSettings {
    #[must_use]
    pub fn from_config(config: &CoreConfig, backend: EncoderBackend) -> Self {
        Self {
            high_quality_crf: config.high_quality_crf,
            standard_crf: config.standard_crf,
            backend,
        }
    }
}

/// Decides how `profile` is converted.
///
/// Returns [`CoreError::PlanningImpossible`] for unreadable profiles.
pub fn plan(profile: &MediaProfile, settings: &PlannerSettings) -> CoreResult<EncodingPlan> {
    let info = profile
        .stream_info()
        .ok_or_else(|| CoreError::PlanningImpossible(profile.path.clone()))?;

    let web_compatible = WEB_COMPATIBLE_CODECS
        .iter()
        .any(|c| info.video_codec.eq_ignore_ascii_case(c));
    let target_container = TARGET_COMPATIBLE_CONTAINERS
        .iter()
        .any(|c| info.container.eq_ignore_ascii_case(c));

    let strategy = if web_compatible && target_container {
        Strategy::StreamCopy
    } else if info.codec_class == CodecClass::Lossless {
        Strategy::HighQualityReencode {
            crf: settings.high_quality_crf,
        }
    } else {
        Strategy::StandardReencode {
            crf: settings.standard_crf,
        }
    };

    let audio = match (&info.audio_codec, strategy) {
        (None, _) => AudioHandling::None,
        (Some(codec), Strategy::StreamCopy) if codec.eq_ignore_ascii_case("aac") => {
            AudioHandling::Copy
        }
        (Some(_), _) => AudioHandling::Aac,
    };

    Ok(EncodingPlan {
        strategy,
        backend: settings.backend,
        audio,
    })
}
