//! Media inspection and classification.
//!
//! `probe` turns a file into a [`ProbeOutcome`] through the [`Prober`] seam;
//! `classify` turns that outcome into an immutable [`MediaProfile`].

pub mod classify;
pub mod probe;

pub use classify::{
    CodecClass, LOSSLESS_CODECS, MediaProfile, Readability, StreamInfo, UnreadableInfo, classify,
};
pub use probe::{
    ProbeFailure, ProbeOutcome, ProbeResult, Prober, parse_ffprobe_json, read_byte_sample,
};
