// ============================================================================
// vconv-core/src/orchestrator.rs
// ============================================================================
//
// ORCHESTRATION: From Input Path to Run Summary
//
// This module ties the components together. Per-file problems never abort a
// run: unreadable files are reported, failed conversions are recorded, and
// only environment or configuration errors surface as Err.
//
// WORKFLOW:
// 1. check_environment: ffmpeg/ffprobe must be runnable (done by the caller)
// 2. Discover candidate files and classify them on a bounded worker pool
// 3. Let the caller select what to convert
// 4. Resolve the encoder backend once for the whole run
// 5. Run the selected jobs on a bounded worker pool: plan, execute, verify,
//    audit
// 6. Return a RunSummary whose exit code reflects failed conversions

use crate::config::CoreConfig;
use crate::discovery::find_candidate_files;
use crate::error::{CoreError, CoreResult};
use crate::external::{Transcoder, check_dependency};
use crate::hardware_accel::{CapabilityProbe, EncoderBackend, host_candidates, select};
use crate::media::{MediaProfile, Prober, Readability, classify};
use crate::planning::{EncodingPlan, PlannerSettings, plan};
use crate::processing::{
    AuditLogger, ConversionJob, ExecutionOutcome, RunLayout, VerificationResult, execute,
    unique_stems, verify,
};
use crate::selection::{SelectionState, selected_indices};
use crate::utils::hex_preview;

use chrono::Local;
use log::{debug, info, warn};
use rayon::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Verifies that the configured ffmpeg and ffprobe can be run.
pub fn check_environment(config: &CoreConfig) -> CoreResult<()> {
    check_dependency(&config.ffmpeg_program)?;
    check_dependency(&config.ffprobe_program)?;
    Ok(())
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

fn build_pool(threads: usize, name: &'static str) -> CoreResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(move |i| format!("vconv-{name}-{i}"))
        .build()
        .map_err(|e| CoreError::OperationFailed(format!("cannot start {name} workers: {e}")))
}

/// Probes and classifies `files` on at most `workers` threads.
///
/// The returned profiles are in the same order as `files`.
pub fn classify_all(
    files: &[PathBuf],
    prober: &dyn Prober,
    workers: usize,
) -> CoreResult<Vec<MediaProfile>> {
    classify_all_with(files, prober, workers, |_| {})
}

/// Like [`classify_all`], calling `on_done` as each file finishes.
pub fn classify_all_with<F>(
    files: &[PathBuf],
    prober: &dyn Prober,
    workers: usize,
    on_done: F,
) -> CoreResult<Vec<MediaProfile>>
where
    F: Fn(&MediaProfile) + Sync,
{
    let pool = build_pool(workers, "probe")?;
    let profiles = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let profile = classify(prober.probe(path));
                if let Readability::Unreadable(info) = &profile.readability {
                    warn!("Unreadable file {}: {}", path.display(), info.reason);
                }
                on_done(&profile);
                profile
            })
            .collect()
    });
    Ok(profiles)
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

/// Final state of one selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded { verification: VerificationResult },
    Failed { reason: String },
    /// Not started because the run was cancelled
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct JobReport {
    pub index: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    pub plan: Option<EncodingPlan>,
    pub status: JobStatus,
}

impl JobReport {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self.status, JobStatus::Succeeded { .. })
    }
}

/// A file that was excluded from conversion because it could not be probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableReport {
    pub path: PathBuf,
    pub reason: String,
    pub byte_sample: Vec<u8>,
}

impl UnreadableReport {
    /// Leading bytes rendered as hex pairs.
    #[must_use]
    pub fn hex_sample(&self) -> String {
        hex_preview(&self.byte_sample)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub run_dir: Option<PathBuf>,
    pub backend: Option<EncoderBackend>,
    pub jobs: Vec<JobReport>,
    pub unreadable: Vec<UnreadableReport>,
    /// Number of files that could have been converted
    pub convertible: usize,
    pub quit: bool,
}

impl RunSummary {
    #[must_use]
    pub fn successes(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| !j.is_failure())
    }

    #[must_use]
    pub fn failures(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| j.is_failure())
    }

    /// Process exit code: non-zero when a selected conversion did not
    /// succeed or nothing convertible was found.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.convertible == 0 || self.failures().next().is_some() {
            1
        } else {
            0
        }
    }
}

fn unreadable_reports(profiles: &[MediaProfile]) -> Vec<UnreadableReport> {
    profiles
        .iter()
        .filter_map(|p| match &p.readability {
            Readability::Unreadable(info) => Some(UnreadableReport {
                path: p.path.clone(),
                reason: info.reason.clone(),
                byte_sample: info.byte_sample.clone(),
            }),
            Readability::Valid(_) => None,
        })
        .collect()
}

// ============================================================================
// BATCH EXECUTION
// ============================================================================

/// Converts `selected` profiles and records each job.
///
/// Jobs run on at most `config.max_concurrent_jobs` threads. Once `cancel`
/// is set no further job starts; running jobs are left to finish. Results
/// are in selection order.
pub fn run_batch(
    selected: &[MediaProfile],
    backend: EncoderBackend,
    transcoder: &dyn Transcoder,
    config: &CoreConfig,
    layout: &RunLayout,
    cancel: &AtomicBool,
) -> CoreResult<Vec<JobReport>> {
    fs::create_dir_all(layout.run_dir())?;
    let audit = AuditLogger::new(layout.run_log_path());
    let settings = PlannerSettings::from_config(config, backend);
    let paths: Vec<PathBuf> = selected.iter().map(|p| p.path.clone()).collect();
    let stems = unique_stems(&paths);

    let pool = build_pool(config.max_concurrent_jobs, "job")?;
    let reports = pool.install(|| {
        selected
            .par_iter()
            .zip(stems.par_iter())
            .enumerate()
            .map(|(i, (profile, stem))| {
                run_job(
                    i + 1,
                    profile,
                    stem,
                    &settings,
                    transcoder,
                    config,
                    layout,
                    &audit,
                    cancel,
                )
            })
            .collect()
    });
    Ok(reports)
}

#[allow(clippy::too_many_arguments)]
fn run_job(
    index: usize,
    profile: &MediaProfile,
    stem: &str,
    settings: &PlannerSettings,
    transcoder: &dyn Transcoder,
    config: &CoreConfig,
    layout: &RunLayout,
    audit: &AuditLogger,
    cancel: &AtomicBool,
) -> JobReport {
    let output = layout.output_path(stem);
    let report = |plan: Option<EncodingPlan>, status: JobStatus| JobReport {
        index,
        source: profile.path.clone(),
        output: output.clone(),
        plan,
        status,
    };

    if cancel.load(Ordering::SeqCst) {
        info!("Skipping {}: run cancelled", profile.path.display());
        return report(None, JobStatus::Cancelled);
    }

    let plan = match plan(profile, settings) {
        Ok(plan) => plan,
        Err(e) => {
            warn!("{e}");
            return report(None, JobStatus::Failed { reason: e.to_string() });
        }
    };
    info!(
        "Job {index}: {} -> {} [{}, {}]",
        profile.path.display(),
        output.display(),
        plan.strategy,
        plan.encoder_label()
    );

    let mut job = ConversionJob::new(
        index,
        profile.path.clone(),
        stem.to_string(),
        layout.job_dir(stem),
        plan,
    );

    if config.debug {
        if let Some(raw) = profile.raw_probe() {
            if let Err(e) = write_probe_dump(raw, &layout.job_probe_dump_path(stem)) {
                warn!("Could not write probe dump for {}: {e}", profile.path.display());
            }
        }
    }

    let status = match execute(&mut job, transcoder, config.conversion_timeout, config.debug) {
        ExecutionOutcome::Success => {
            let verification = verify(&job.source, &job.output_path);
            job.output_size = fs::metadata(&job.output_path).ok().map(|m| m.len());
            job.verification = Some(verification.clone());
            JobStatus::Succeeded { verification }
        }
        ExecutionOutcome::Failure { reason, .. } => JobStatus::Failed { reason },
    };

    if let Err(e) = audit.record(&job) {
        warn!("Could not write audit log for job {index}: {e}");
    }
    report(Some(plan), status)
}

/// Writes each profile's raw probe output verbatim under the run's probe
/// directory, unreadable files included. Returns the number of dumps written.
pub fn write_probe_dumps(profiles: &[MediaProfile], layout: &RunLayout) -> CoreResult<usize> {
    let paths: Vec<PathBuf> = profiles.iter().map(|p| p.path.clone()).collect();
    let mut written = 0;
    for (profile, stem) in profiles.iter().zip(unique_stems(&paths)) {
        if let Some(raw) = profile.raw_probe() {
            write_probe_dump(raw, &layout.probe_dump_path(&stem))?;
            written += 1;
        }
    }
    Ok(written)
}

fn write_probe_dump(raw: &str, path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, raw)?;
    debug!("Wrote probe dump {}", path.display());
    Ok(())
}

// ============================================================================
// FULL RUN
// ============================================================================

/// External collaborators of a run.
pub struct RunDependencies<'a> {
    pub prober: &'a dyn Prober,
    pub transcoder: &'a dyn Transcoder,
    pub capability_probe: &'a dyn CapabilityProbe,
}

/// Hooks through which the caller observes and steers a run.
pub trait RunObserver {
    /// Called after discovery with the number of files about to be probed.
    fn files_discovered(&self, _count: usize) {}

    /// Called once per file as classification completes.
    fn file_classified(&self, _profile: &MediaProfile) {}

    /// Called after classification with every profile, in discovery order.
    fn files_classified(&self, _profiles: &[MediaProfile]) {}

    /// Chooses what to convert. Must return a final selection state.
    fn select(&self, profiles: &[MediaProfile]) -> CoreResult<SelectionState>;
}

/// Discovers, classifies, selects and converts everything under `input`.
pub fn process_input<O>(
    config: &CoreConfig,
    input: &Path,
    deps: &RunDependencies<'_>,
    observer: &O,
    cancel: &AtomicBool,
) -> CoreResult<RunSummary>
where
    O: RunObserver + Sync,
{
    config.validate()?;

    let files = find_candidate_files(input)?;
    info!("Found {} candidate file(s) under {}", files.len(), input.display());
    observer.files_discovered(files.len());

    let profiles = classify_all_with(&files, deps.prober, config.probe_workers, |p| {
        observer.file_classified(p);
    })?;
    observer.files_classified(&profiles);

    let mut summary = RunSummary {
        unreadable: unreadable_reports(&profiles),
        convertible: profiles.iter().filter(|p| p.is_valid()).count(),
        ..RunSummary::default()
    };

    let layout = RunLayout::new(&config.output_root, Local::now());
    if config.debug {
        match write_probe_dumps(&profiles, &layout) {
            Ok(0) => {}
            Ok(n) => {
                info!("Wrote {n} probe dump(s) to {}", layout.probe_dir().display());
                summary.run_dir = Some(layout.run_dir().to_path_buf());
            }
            Err(e) => warn!("Could not write probe dumps: {e}"),
        }
    }

    if summary.convertible == 0 {
        warn!("No convertible files found under {}", input.display());
        return Ok(summary);
    }

    let state = observer.select(&profiles)?;
    let chosen: Vec<MediaProfile> = selected_indices(state, &profiles)
        .into_iter()
        .map(|i| profiles[i].clone())
        .collect();
    if chosen.is_empty() {
        info!("Nothing selected, exiting");
        summary.quit = state == SelectionState::Quit;
        return Ok(summary);
    }

    let backend = select(
        &host_candidates(config.disable_hwaccel),
        deps.capability_probe,
    );
    summary.backend = Some(backend);

    summary.run_dir = Some(layout.run_dir().to_path_buf());
    summary.jobs = run_batch(&chosen, backend, deps.transcoder, config, &layout, cancel)?;
    Ok(summary)
}
