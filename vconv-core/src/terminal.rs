//! Terminal UI components and styling for vconv.
//!
//! Output goes through the `log` facade at info level so the console and
//! the run log file see the same text; the CLI's logger decides where it
//! lands. Colors are dropped when `NO_COLOR` is set.

use crate::media::{MediaProfile, Readability};
use crate::orchestrator::{JobStatus, RunSummary};
use crate::processing::VerificationResult;
use crate::utils::{format_bytes, format_duration, hex_preview};

use console::{measure_text_width, style};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;

use std::io::IsTerminal;
use std::time::Duration;

const LABEL_WIDTH: usize = 15;

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Print a section header for major workflow phases
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", style(title.to_uppercase()).cyan().bold());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print a status line (key-value pair)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let padding = LABEL_WIDTH.saturating_sub(measure_text_width(label)).max(1);
    let value = if should_use_color() && highlight {
        style(value).bold().to_string()
    } else {
        value.to_string()
    };
    info!("  {label}:{} {value}", " ".repeat(padding));
}

/// Print a success message
pub fn print_success(message: &str) {
    if should_use_color() {
        info!("  ✓ {}", style(message).green());
    } else {
        info!("  ✓ {message}");
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    if should_use_color() {
        info!("  ⚠ {}", style(message).yellow());
    } else {
        info!("  ⚠ {message}");
    }
}

/// Print an error message
pub fn print_error(title: &str, message: &str, suggestion: Option<&str>) {
    if should_use_color() {
        info!("✗ {}", style(title).red().bold());
    } else {
        info!("✗ {title}");
    }
    info!("  Message:  {message}");
    if let Some(suggestion_text) = suggestion {
        info!("  Suggestion: {suggestion_text}");
    }
}

fn describe(profile: &MediaProfile) -> String {
    match &profile.readability {
        Readability::Valid(info) => {
            let resolution = profile
                .resolution()
                .map_or_else(|| "?x?".to_string(), |(w, h)| format!("{w}x{h}"));
            let lossless = if profile.is_lossless() { " lossless" } else { "" };
            let duration = profile
                .duration_secs()
                .map_or_else(|| "??:??:??".to_string(), format_duration);
            let bit_rate = profile
                .bit_rate()
                .map_or_else(|| "? kb/s".to_string(), |b| format!("{} kb/s", b / 1000));
            format!(
                "{} / {}{lossless}, {resolution} @ {}, audio {}, {duration}, {bit_rate}",
                info.container,
                info.video_codec,
                info.frame_rate.as_deref().unwrap_or("?"),
                profile.audio_codec().unwrap_or("none")
            )
        }
        Readability::Unreadable(info) => {
            format!("UNREADABLE ({}) [{}]", info.reason, hex_preview(&info.byte_sample))
        }
    }
}

/// Print the numbered table of classified files
pub fn print_file_table(profiles: &[MediaProfile]) {
    print_section("Files");
    for (i, profile) in profiles.iter().enumerate() {
        let line = format!(
            "{:>3}. {}  ({})  {}",
            i + 1,
            profile.file_name(),
            format_bytes(profile.size),
            describe(profile)
        );
        if should_use_color() && !profile.is_valid() {
            info!("  {}", style(line).dim());
        } else {
            info!("  {line}");
        }
    }
}

/// Creates the progress bar shown while files are probed (hidden when not a terminal)
#[must_use]
pub fn probe_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("  ⧖ Probing: {pos}/{len} [{bar:30}] {msg}")
    {
        pb.set_style(style.progress_chars("##."));
    }
    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print the end-of-run summary
pub fn print_summary(summary: &RunSummary) {
    print_section("Summary");

    if let Some(dir) = &summary.run_dir {
        print_status("Output", &dir.display().to_string(), false);
    }
    if let Some(backend) = summary.backend {
        print_status("Encoder", &backend.to_string(), false);
    }
    print_status("Convertible", &summary.convertible.to_string(), false);
    print_status("Succeeded", &summary.successes().count().to_string(), true);
    print_status("Failed", &summary.failures().count().to_string(), true);
    print_status("Unreadable", &summary.unreadable.len().to_string(), false);

    for job in &summary.jobs {
        let name = job.source.display();
        match &job.status {
            JobStatus::Succeeded { verification } => match verification {
                VerificationResult::Verified { checksum_out, .. } => print_success(&format!(
                    "{name} -> {} (sha256 {})",
                    job.output.display(),
                    &checksum_out[..checksum_out.len().min(16)]
                )),
                VerificationResult::Unverifiable(reason) => print_warning(&format!(
                    "{name} -> {} (unverifiable: {reason})",
                    job.output.display()
                )),
            },
            JobStatus::Failed { reason } => {
                print_error(&format!("{name} failed"), reason, None);
            }
            JobStatus::Cancelled => print_warning(&format!("{name}: cancelled before start")),
        }
    }

    for report in &summary.unreadable {
        print_warning(&format!(
            "{}: {} [first bytes: {}]",
            report.path.display(),
            report.reason,
            report.hex_sample()
        ));
    }
}
