//! ffmpeg argument building for conversions.
//!
//! Argument construction is kept separate from execution so the exact
//! command line for every strategy and backend can be checked without
//! spawning anything.

use crate::hardware_accel::EncoderBackend;
use crate::planning::{AudioHandling, EncodingPlan, Strategy};

use std::path::Path;

/// Bitrate used when audio is re-encoded to AAC.
pub const AAC_BITRATE: &str = "192k";

/// Everything needed to build one conversion command line.
#[derive(Debug, Clone, Copy)]
pub struct ConversionArgs<'a> {
    pub input: &'a Path,
    /// Temporary output path ffmpeg writes to
    pub output: &'a Path,
    pub plan: &'a EncodingPlan,
    pub debug: bool,
}

/// Builds the ffmpeg arguments (without the program name).
///
/// Layout: `[-loglevel debug] [backend input args] -i <src> <video> <audio>
/// -movflags +faststart -f mp4 -y <tmp>`.
#[must_use]
pub fn build_conversion_args(params: &ConversionArgs<'_>) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let input = params.input.to_string_lossy();
    let output = params.output.to_string_lossy();

    if params.debug {
        push(&mut args, &["-loglevel", "debug"]);
    }

    let backend = params.plan.backend;
    if params.plan.strategy != Strategy::StreamCopy {
        args.extend(backend.input_args());
    }

    push(&mut args, &["-i", &*input]);

    match (params.plan.strategy, backend) {
        (Strategy::StreamCopy, _) => push(&mut args, &["-c:v", "copy"]),
        (Strategy::HighQualityReencode { crf }, EncoderBackend::Software) => {
            let crf = crf.to_string();
            push(
                &mut args,
                &[
                    "-c:v", "libx264", "-preset", "slow", "-crf", crf.as_str(), "-profile:v",
                    "high", "-pix_fmt", "yuv420p", "-bf", "2", "-g", "25", "-coder", "1",
                ],
            );
        }
        (Strategy::StandardReencode { crf }, EncoderBackend::Software) => {
            let crf = crf.to_string();
            push(
                &mut args,
                &["-c:v", "libx264", "-preset", "medium", "-crf", crf.as_str(), "-pix_fmt", "yuv420p"],
            );
        }
        (Strategy::HighQualityReencode { crf } | Strategy::StandardReencode { crf }, hw) => {
            if let Some(filter) = hw.upload_filter() {
                push(&mut args, &["-vf", filter]);
            }
            let quality = hw.quality_value(crf).to_string();
            push(
                &mut args,
                &["-c:v", hw.encoder_name(), hw.quality_flag(), quality.as_str(), "-pix_fmt", "yuv420p"],
            );
        }
    }

    match params.plan.audio {
        AudioHandling::Aac => push(&mut args, &["-c:a", "aac", "-b:a", AAC_BITRATE]),
        AudioHandling::Copy => push(&mut args, &["-c:a", "copy"]),
        AudioHandling::None => push(&mut args, &["-an"]),
    }

    push(&mut args, &["-movflags", "+faststart", "-f", "mp4", "-y", &*output]);
    args
}

fn push(args: &mut Vec<String>, items: &[&str]) {
    args.extend(items.iter().map(|s| (*s).to_string()));
}
