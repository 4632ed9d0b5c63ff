// Shared fakes for the vconv-core integration tests.
#![allow(dead_code)]

use vconv_core::external::Transcoder;
use vconv_core::media::{ProbeFailure, ProbeResult};
use vconv_core::util::command::ProcessOutput;
use vconv_core::{
    CapabilityProbe, CoreResult, EncoderBackend, MediaProfile, ProbeOutcome, Prober,
    RunObserver, SelectionState,
};

use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Files whose content starts with this marker probe as lossless AVI.
pub const LOSSLESS_MARKER: &[u8] = b"FAKE-HUFFYUV";

/// Files whose content starts with this marker probe as H.264 in MP4.
pub const H264_MARKER: &[u8] = b"FAKE-H264";

pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

fn probed(path: &Path, size: u64, container: &str, codec: &str) -> ProbeOutcome {
    ProbeOutcome::Probed(ProbeResult {
        path: path.to_path_buf(),
        size,
        container: container.to_string(),
        video_codec: codec.to_string(),
        audio_codec: Some("pcm_s16le".to_string()),
        width: Some(640),
        height: Some(480),
        frame_rate: Some("25/1".to_string()),
        duration_secs: Some(2.0),
        bit_rate: None,
        raw_output: Some(format!("{{\"format\":{{\"format_name\":\"{container}\"}}}}")),
    })
}

/// Raw output the marker prober attaches to files it cannot read.
pub const UNREADABLE_RAW: &str = "{\"streams\": [garbage\n";

/// Decides readability from the file's leading bytes.
pub struct MarkerProber;

impl Prober for MarkerProber {
    fn probe(&self, path: &Path) -> ProbeOutcome {
        let content = std::fs::read(path).unwrap_or_default();
        let size = content.len() as u64;
        if content.starts_with(LOSSLESS_MARKER) {
            probed(path, size, "AVI", "huffyuv")
        } else if content.starts_with(H264_MARKER) {
            probed(path, size, "MOV", "h264")
        } else {
            ProbeOutcome::Failed(
                ProbeFailure::from_path(path, "Invalid data found when processing input")
                    .with_raw_output(Some(UNREADABLE_RAW.to_string())),
            )
        }
    }
}

/// Copies the `-i` input to the final argument, like a perfect stream copy.
///
/// Inputs whose name contains "slow" block past the timeout and report a
/// kill; inputs containing "broken" exit with status 1.
#[derive(Default)]
pub struct CopyTranscoder {
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub delay: Option<Duration>,
    pub seen_args: Mutex<Vec<Vec<String>>>,
}

impl CopyTranscoder {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

fn output(status: Option<ExitStatus>, stderr: &str, timed_out: bool) -> ProcessOutput {
    ProcessOutput {
        status,
        stdout: String::new(),
        stderr: stderr.to_string(),
        combined: stderr.to_string(),
        timed_out,
        elapsed: Duration::from_millis(5),
    }
}

impl Transcoder for CopyTranscoder {
    fn transcode(&self, args: &[String], timeout: Option<Duration>) -> CoreResult<ProcessOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.seen_args.lock().unwrap().push(args.to_vec());

        let input_pos = args.iter().position(|a| a == "-i").unwrap() + 1;
        let input = PathBuf::from(&args[input_pos]);
        let out = PathBuf::from(args.last().unwrap());
        let name = input.file_name().unwrap().to_string_lossy().to_string();

        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        let result = if name.contains("slow") {
            thread::sleep(timeout.unwrap_or(Duration::from_millis(50)));
            output(None, "frame=  10 fps=5.0\n", true)
        } else if name.contains("broken") {
            output(Some(exit_status(1)), "Conversion failed!\n", false)
        } else {
            std::fs::copy(&input, &out)?;
            output(Some(exit_status(0)), "video:1kB audio:0kB\n", false)
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(result)
    }
}

/// Capability probe that reports only the listed backends as usable.
pub struct FixedCapabilities(pub Vec<EncoderBackend>);

impl CapabilityProbe for FixedCapabilities {
    fn is_usable(&self, backend: EncoderBackend) -> bool {
        self.0.contains(&backend)
    }
}

/// Observer answering the selection prompt with a fixed state.
pub struct FixedSelection {
    pub state: SelectionState,
    pub classified: AtomicUsize,
    pub table: Mutex<Vec<String>>,
}

impl FixedSelection {
    pub fn new(state: SelectionState) -> Self {
        Self {
            state,
            classified: AtomicUsize::new(0),
            table: Mutex::new(Vec::new()),
        }
    }
}

impl RunObserver for FixedSelection {
    fn file_classified(&self, _profile: &MediaProfile) {
        self.classified.fetch_add(1, Ordering::SeqCst);
    }

    fn files_classified(&self, profiles: &[MediaProfile]) {
        let mut table = self.table.lock().unwrap();
        table.extend(profiles.iter().map(MediaProfile::file_name));
    }

    fn select(&self, _profiles: &[MediaProfile]) -> CoreResult<SelectionState> {
        Ok(self.state)
    }
}

/// Lists every file below `dir` whose name ends with `suffix`.
pub fn files_ending_with(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.to_string_lossy().ends_with(suffix))
        .collect()
}
