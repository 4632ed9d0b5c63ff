// ============================================================================
// vconv-core/src/processing/executor.rs
// ============================================================================
//
// CONVERSION EXECUTION: Running One Job Through the Transcoder
//
// ffmpeg always writes to a temporary sibling of the final output. The file
// is renamed into place only after a successful exit; on any failure or
// timeout the temporary is removed, so a final MP4 only ever exists for a
// completed conversion.

use crate::external::ffmpeg::{ConversionArgs, build_conversion_args};
use crate::external::Transcoder;
use crate::processing::job::{ConversionJob, ExecutionOutcome};
use crate::temp_files::create_partial_output;

use chrono::Local;
use log::{debug, error, info, warn};
use tempfile::TempPath;

use std::time::{Duration, Instant};

/// Lines of process output kept on a failure outside debug mode.
const FAILURE_OUTPUT_TAIL: usize = 20;

/// Runs `job` and records command, timings, exit status and outcome on it.
pub fn execute(
    job: &mut ConversionJob,
    transcoder: &dyn Transcoder,
    timeout: Option<Duration>,
    debug_mode: bool,
) -> ExecutionOutcome {
    let outcome = run(job, transcoder, timeout, debug_mode);
    match &outcome {
        ExecutionOutcome::Success => info!(
            "Converted {} -> {}",
            job.source.display(),
            job.output_path.display()
        ),
        ExecutionOutcome::Failure { reason, .. } => {
            error!("Conversion of {} failed: {reason}", job.source.display());
        }
    }
    job.outcome = Some(outcome.clone());
    outcome
}

fn run(
    job: &mut ConversionJob,
    transcoder: &dyn Transcoder,
    timeout: Option<Duration>,
    debug_mode: bool,
) -> ExecutionOutcome {
    let temp = match create_partial_output(&job.job_dir, &job.stem) {
        Ok(temp) => temp,
        Err(e) => {
            return failure(None, format!("cannot create temporary output: {e}"), None);
        }
    };
    job.temp_path = Some(temp.to_path_buf());

    let args = build_conversion_args(&ConversionArgs {
        input: &job.source,
        output: &temp,
        plan: &job.plan,
        debug: debug_mode,
    });
    job.command_line = Some(format!("{} {}", transcoder.program(), args.join(" ")));
    debug!("Job {} command: {:?}", job.index, job.command_line);

    job.started_at = Some(Local::now());
    let clock = Instant::now();
    let result = transcoder.transcode(&args, timeout);
    job.finished_at = Some(Local::now());
    job.elapsed = Some(clock.elapsed());

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            discard(temp);
            return failure(None, e.to_string(), None);
        }
    };

    job.exit_code = output.exit_code();
    if debug_mode {
        job.captured_output = Some(output.combined.clone());
    }
    let captured = if debug_mode {
        output.combined.clone()
    } else {
        tail(&output.combined, FAILURE_OUTPUT_TAIL)
    };

    if output.timed_out {
        discard(temp);
        let limit = timeout.map_or(0.0, |t| t.as_secs_f64());
        return failure(None, format!("timed out after {limit} s"), Some(captured));
    }

    if !output.success() {
        discard(temp);
        let reason = match output.exit_code() {
            Some(code) => format!("ffmpeg exited with status {code}"),
            None => "ffmpeg terminated by signal".to_string(),
        };
        return failure(output.exit_code(), reason, Some(captured));
    }

    match temp.persist(&job.output_path) {
        Ok(()) => ExecutionOutcome::Success,
        Err(e) => {
            let reason = format!(
                "cannot move output into place at {}: {}",
                job.output_path.display(),
                e.error
            );
            discard(e.path);
            failure(output.exit_code(), reason, Some(captured))
        }
    }
}

fn failure(exit_code: Option<i32>, reason: String, captured_output: Option<String>) -> ExecutionOutcome {
    ExecutionOutcome::Failure {
        exit_code,
        reason,
        captured_output,
    }
}

fn discard(temp: TempPath) {
    let path = temp.to_path_buf();
    if let Err(e) = temp.close() {
        warn!("Failed to remove temporary output {}: {e}", path.display());
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
