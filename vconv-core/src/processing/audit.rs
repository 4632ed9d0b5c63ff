// ============================================================================
// vconv-core/src/processing/audit.rs
// ============================================================================
//
// AUDIT TRAIL: Per-Job and Per-Run Conversion Records
//
// Every finished job appends one block to its own conversion.log and one line
// to the run-level run.log. Both files are only ever opened for appending.

use crate::error::CoreResult;
use crate::processing::job::{ConversionJob, ExecutionOutcome};
use crate::processing::verify::VerificationResult;
use crate::utils::{format_bytes, format_duration};

use chrono::{DateTime, Local, SecondsFormat};
use log::debug;

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Writes the audit records of one run.
#[derive(Debug)]
pub struct AuditLogger {
    run_log: PathBuf,
    /// Serializes run.log appends from concurrent jobs
    run_log_lock: Mutex<()>,
}

impl AuditLogger {
    #[must_use]
    pub fn new(run_log: PathBuf) -> Self {
        Self {
            run_log,
            run_log_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn run_log_path(&self) -> &Path {
        &self.run_log
    }

    /// Appends the job block to `job.log_path` and its summary line to run.log.
    pub fn record(&self, job: &ConversionJob) -> CoreResult<()> {
        append(&job.log_path, &job_block(job))?;

        let line = summary_line(job);
        let _guard = self
            .run_log_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        append(&self.run_log, &line)?;
        debug!("Recorded job {} in {}", job.index, job.log_path.display());
        Ok(())
    }
}

fn append(path: &Path, text: &str) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

fn timestamp(ts: Option<&DateTime<Local>>) -> String {
    ts.map_or_else(
        || "-".to_string(),
        |t| t.to_rfc3339_opts(SecondsFormat::Millis, false),
    )
}

fn status_text(job: &ConversionJob) -> String {
    match &job.outcome {
        Some(ExecutionOutcome::Success) => "SUCCESS".to_string(),
        Some(ExecutionOutcome::Failure { reason, .. }) => format!("FAILED ({reason})"),
        None => "NOT RUN".to_string(),
    }
}

fn job_block(job: &ConversionJob) -> String {
    let mut block = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(block, "=== Job {}: {} ===", job.index, job.source_name());
    let _ = writeln!(block, "Source:          {}", job.source.display());
    let _ = writeln!(block, "Output:          {}", job.output_path.display());
    let _ = writeln!(block, "Strategy:        {}", job.plan.strategy);
    let _ = writeln!(block, "Backend:         {}", job.plan.encoder_label());
    let _ = writeln!(
        block,
        "Command:         {}",
        job.command_line.as_deref().unwrap_or("-")
    );
    let _ = writeln!(block, "Start:           {}", timestamp(job.started_at.as_ref()));
    let _ = writeln!(block, "End:             {}", timestamp(job.finished_at.as_ref()));
    if let Some(elapsed) = job.elapsed {
        let _ = writeln!(
            block,
            "Duration:        {} ({:.2}s)",
            format_duration(elapsed.as_secs_f64()),
            elapsed.as_secs_f64()
        );
    }
    let _ = writeln!(
        block,
        "Exit status:     {}",
        job.exit_code.map_or_else(|| "none".to_string(), |c| c.to_string())
    );
    let _ = writeln!(block, "Status:          {}", status_text(job));

    match &job.verification {
        Some(VerificationResult::Verified {
            checksum_in,
            checksum_out,
        }) => {
            let _ = writeln!(block, "Input SHA-256:   {checksum_in}");
            let _ = writeln!(block, "Output SHA-256:  {checksum_out}");
        }
        Some(VerificationResult::Unverifiable(reason)) => {
            let _ = writeln!(block, "Verification:    unverifiable ({reason})");
        }
        None => {}
    }
    if let Some(size) = job.output_size {
        let _ = writeln!(block, "Output size:     {} ({size} bytes)", format_bytes(size));
    }

    let captured = job.captured_output.as_deref().or(match &job.outcome {
        Some(ExecutionOutcome::Failure {
            captured_output, ..
        }) => captured_output.as_deref(),
        _ => None,
    });
    if let Some(output) = captured {
        let _ = writeln!(block, "FFmpeg output:");
        let _ = writeln!(block, "{}", output.trim_end());
    }
    block.push('\n');
    block
}

fn summary_line(job: &ConversionJob) -> String {
    let verification = match &job.verification {
        Some(VerificationResult::Verified { checksum_out, .. }) => {
            format!("sha256={checksum_out}")
        }
        Some(VerificationResult::Unverifiable(_)) => "unverifiable".to_string(),
        None => "unverified".to_string(),
    };
    format!(
        "{} job={} status={} strategy={} backend={} {} source=\"{}\" output=\"{}\"\n",
        timestamp(job.finished_at.as_ref()),
        job.index,
        status_text(job),
        job.plan.strategy.name(),
        job.plan.encoder_label(),
        verification,
        job.source.display(),
        job.output_path.display()
    )
}
