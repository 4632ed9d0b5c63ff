//! The conversion job: one selected file on its way to MP4.
//!
//! A job is created when a file is selected, filled in by the executor and
//! the verifier, written once to its audit log and then only read.

use crate::hardware_accel::EncoderBackend;
use crate::planning::EncodingPlan;
use crate::processing::verify::VerificationResult;

use chrono::{DateTime, Local};

use std::path::PathBuf;
use std::time::Duration;

/// Result of running the transcoder for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    Failure {
        exit_code: Option<i32>,
        reason: String,
        /// Process output, kept for failures so they can be diagnosed
        captured_output: Option<String>,
    },
}

impl ExecutionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success)
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Success => None,
            ExecutionOutcome::Failure { reason, .. } => Some(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// 1-based position in the batch
    pub index: usize,
    pub source: PathBuf,
    pub stem: String,
    pub job_dir: PathBuf,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    pub plan: EncodingPlan,
    /// Backend resolved for the run
    pub backend: EncoderBackend,

    // ---- Filled in by the executor ----
    pub temp_path: Option<PathBuf>,
    pub command_line: Option<String>,
    pub started_at: Option<DateTime<Local>>,
    pub finished_at: Option<DateTime<Local>>,
    pub elapsed: Option<Duration>,
    pub exit_code: Option<i32>,
    /// Full process output in debug mode
    pub captured_output: Option<String>,
    pub outcome: Option<ExecutionOutcome>,

    // ---- Filled in by the verifier ----
    pub verification: Option<VerificationResult>,
    pub output_size: Option<u64>,
}

impl ConversionJob {
    #[must_use]
    pub fn new(
        index: usize,
        source: PathBuf,
        stem: String,
        job_dir: PathBuf,
        plan: EncodingPlan,
    ) -> Self {
        let output_path = job_dir.join(format!("{stem}.{}", crate::config::TARGET_EXTENSION));
        let log_path = job_dir.join(crate::processing::layout::JOB_LOG_NAME);
        Self {
            index,
            source,
            stem,
            job_dir,
            output_path,
            log_path,
            backend: plan.backend,
            plan,
            temp_path: None,
            command_line: None,
            started_at: None,
            finished_at: None,
            elapsed: None,
            exit_code: None,
            captured_output: None,
            outcome: None,
            verification: None,
            output_size: None,
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcome.as_ref().is_some_and(ExecutionOutcome::is_success)
    }

    /// Display name of the source file.
    #[must_use]
    pub fn source_name(&self) -> String {
        crate::media::classify::display_name(&self.source)
    }
}
