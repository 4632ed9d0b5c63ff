// ============================================================================
// vconv-core/src/processing/layout.rs
// ============================================================================
//
// OUTPUT LAYOUT: Timestamp-Partitioned Output Directories
//
// <output_root>/<DDMonYYYY>/<HHhMMmSSs>/<stem>/<stem>.mp4
//
// The run timestamp is captured once, so every job of a batch lands in the
// same <date>/<time> directory, next to the run-level run.log.

use crate::config::TARGET_EXTENSION;

use chrono::{DateTime, Local};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Longest stem kept after sanitizing.
pub const MAX_STEM_LEN: usize = 60;

/// Stem used when nothing usable remains of the original name.
pub const FALLBACK_STEM: &str = "untitled";

pub const RUN_LOG_NAME: &str = "run.log";
pub const JOB_LOG_NAME: &str = "conversion.log";
pub const PROBE_DIR_NAME: &str = "probes";

/// Makes a file stem safe for use as a directory and file name.
///
/// ASCII alphanumerics, space, `_` and `-` are kept; anything else becomes
/// `_`. The result is truncated and never empty.
#[must_use]
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LEN)
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sanitized stems for `paths`, made unique with `_2`, `_3`, ... in order.
#[must_use]
pub fn unique_stems(paths: &[PathBuf]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut taken: Vec<String> = Vec::with_capacity(paths.len());

    for path in paths {
        let base = sanitize_stem(
            &path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;

        let mut candidate = if *count == 1 {
            base.clone()
        } else {
            format!("{base}_{count}")
        };
        // A literal "clip_2" earlier in the batch must not be shadowed.
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{base}_{count}");
        }
        taken.push(candidate);
    }
    taken
}

/// Directory layout of one run.
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub started_at: DateTime<Local>,
    run_dir: PathBuf,
}

impl RunLayout {
    /// Lays out a run under `output_root` for the given start time.
    #[must_use]
    pub fn new(output_root: &Path, started_at: DateTime<Local>) -> Self {
        let run_dir = output_root
            .join(started_at.format("%d%b%Y").to_string())
            .join(started_at.format("%Hh%Mm%Ss").to_string());
        Self {
            started_at,
            run_dir,
        }
    }

    #[must_use]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    #[must_use]
    pub fn run_log_path(&self) -> PathBuf {
        self.run_dir.join(RUN_LOG_NAME)
    }

    #[must_use]
    pub fn job_dir(&self, stem: &str) -> PathBuf {
        self.run_dir.join(stem)
    }

    #[must_use]
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.job_dir(stem).join(format!("{stem}.{TARGET_EXTENSION}"))
    }

    #[must_use]
    pub fn job_log_path(&self, stem: &str) -> PathBuf {
        self.job_dir(stem).join(JOB_LOG_NAME)
    }

    /// Debug probe dumps for every classified file, selected or not.
    #[must_use]
    pub fn probe_dir(&self) -> PathBuf {
        self.run_dir.join(PROBE_DIR_NAME)
    }

    #[must_use]
    pub fn probe_dump_path(&self, stem: &str) -> PathBuf {
        self.probe_dir().join(format!("{stem}.probe.json"))
    }

    /// Copy of the probe dump kept next to a converted file.
    #[must_use]
    pub fn job_probe_dump_path(&self, stem: &str) -> PathBuf {
        self.job_dir(stem).join(format!("{stem}.probe.json"))
    }
}
