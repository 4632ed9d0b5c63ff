// ============================================================================
// vconv-core/src/util/command.rs
// ============================================================================
//
// COMMAND EXECUTION: Bounded External Process Execution
//
// Every external process vconv runs (ffprobe, ffmpeg, capability probes)
// goes through this module so that output capture and timeout handling
// behave the same everywhere. Output is read on background threads to keep
// the child from blocking on full pipes; the caller's thread polls the child
// and kills it once the deadline passes.

use crate::error::{CoreResult, command_start_error, command_wait_error};

use log::{debug, warn};

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep collecting output after a timed-out child was killed.
const KILL_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputStream {
    Stdout,
    Stderr,
}

/// Captured result of a finished (or killed) external process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status; `None` when the process was killed on timeout
    pub status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
    /// Both streams interleaved in arrival order
    pub combined: String,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl ProcessOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.is_some_and(|s| s.success())
    }

    /// Exit code, if the process exited normally.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Spawns `cmd` with piped output and waits for it, killing it after `timeout`.
///
/// Stdin is closed so tools never wait on the terminal.
pub fn run_command(
    cmd: &mut Command,
    label: &str,
    timeout: Option<Duration>,
) -> CoreResult<ProcessOutput> {
    log_command(cmd);

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_start_error(label, e))?;

    wait_with_timeout(&mut child, label, timeout)
}

/// Collects output from an already spawned child and enforces `timeout`.
///
/// Takes ownership of the child's stdout/stderr handles if they are piped.
pub fn wait_with_timeout(
    child: &mut Child,
    label: &str,
    timeout: Option<Duration>,
) -> CoreResult<ProcessOutput> {
    let start = Instant::now();
    let (tx, rx) = mpsc::channel();

    if let Some(stdout) = child.stdout.take() {
        spawn_line_reader(stdout, OutputStream::Stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_reader(stderr, OutputStream::Stderr, tx.clone());
    }
    drop(tx);

    let status = match timeout {
        None => Some(child.wait().map_err(|e| command_wait_error(label, e))?),
        Some(limit) => loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) if start.elapsed() >= limit => {
                    warn!(
                        "{label} exceeded timeout of {}s, terminating process",
                        limit.as_secs_f64()
                    );
                    if let Err(e) = child.kill() {
                        debug!("Failed to kill {label}: {e}");
                    }
                    // Reap the child so it does not linger as a zombie.
                    let _ = child.wait();
                    break None;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(command_wait_error(label, e)),
            }
        },
    };

    let timed_out = status.is_none();
    let mut output = collect_output(&rx, timed_out);
    output.status = status;
    output.timed_out = timed_out;
    output.elapsed = start.elapsed();

    debug!(
        "{label} finished in {:.2}s (exit: {:?}, timed out: {})",
        output.elapsed.as_secs_f64(),
        output.exit_code(),
        output.timed_out
    );
    Ok(output)
}

fn spawn_line_reader<R>(source: R, stream: OutputStream, tx: Sender<(OutputStream, String)>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send((stream, line)).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn collect_output(rx: &Receiver<(OutputStream, String)>, timed_out: bool) -> ProcessOutput {
    let mut output = ProcessOutput {
        status: None,
        stdout: String::new(),
        stderr: String::new(),
        combined: String::new(),
        timed_out,
        elapsed: Duration::ZERO,
    };

    let mut push = |stream: OutputStream, line: String| {
        let target = match stream {
            OutputStream::Stdout => &mut output.stdout,
            OutputStream::Stderr => &mut output.stderr,
        };
        target.push_str(&line);
        target.push('\n');
        output.combined.push_str(&line);
        output.combined.push('\n');
    };

    if timed_out {
        // Grandchildren may still hold the pipes open; do not wait on them.
        loop {
            match rx.recv_timeout(KILL_GRACE) {
                Ok((stream, line)) => push(stream, line),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
    } else {
        for (stream, line) in rx.iter() {
            push(stream, line);
        }
    }
    output
}

/// Logs a command line at debug level.
pub fn log_command(cmd: &Command) {
    debug!("Executing command: {}", format_command(cmd));
}

/// Renders a command as a single shell-like line.
#[must_use]
pub fn format_command(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<_> = cmd.get_args().map(|arg| arg.to_string_lossy()).collect();
    if args.is_empty() {
        program.into_owned()
    } else {
        format!("{program} {}", args.join(" "))
    }
}
