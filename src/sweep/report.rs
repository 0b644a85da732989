//! Output surfacing and completion accounting.
//!
//! The reporter is the single consumer of [`WorkerEvent`]s. It prints each
//! task's argument vector before launch and its captured stdout after
//! completion, and tallies a [`SweepReport`]. Output is written, never
//! parsed.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::sweep::worker::{TaskOutcome, WorkerEvent};

/// Completion accounting for a finished sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tasks launched (equals `succeeded + failed` after the join).
    pub dispatched: u64,
    /// Tasks whose process exited with status zero.
    pub succeeded: u64,
    /// Tasks that failed for any reason.
    pub failed: u64,
    /// Failed tasks whose process never started.
    pub launch_failures: u64,
    /// Highest number of tasks observed running at once.
    pub peak_concurrency: usize,
    /// Wall-clock time of the whole sweep.
    pub elapsed: Duration,
}

impl SweepReport {
    /// Tasks that reached a terminal state.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Returns `true` if no task failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Destination for sweep output.
pub type OutputSink = Box<dyn Write + Send>;

/// In-memory [`Write`] target that can be cloned and inspected while the
/// sweep writes to it.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Formats the line printed before a task launches.
pub fn format_launch(argv: &[String]) -> String {
    format!("input: {argv:?}")
}

/// Formats the status line printed after a task's captured output.
pub fn format_completion(outcome: &TaskOutcome) -> String {
    let task = &outcome.task;
    match outcome.result.error() {
        None => format!(
            "finished #{} ({}) in {:.2?}",
            task.index(),
            task.param(),
            outcome.elapsed
        ),
        Some(err) => format!(
            "failed #{} ({}) after {:.2?}: {err}",
            task.index(),
            task.param(),
            outcome.elapsed
        ),
    }
}

/// Consumes worker events until every sender is dropped.
///
/// Launch lines are flushed before the waiting worker is released, so a
/// task's argument vector is always out before its process starts.
///
/// Returns the tallied report; `peak_concurrency` and `elapsed` are filled
/// in by the dispatcher.
pub async fn reporter_loop(mut events: mpsc::Receiver<WorkerEvent>, mut out: OutputSink) -> SweepReport {
    let mut report = SweepReport::default();
    let mut write_failed = false;

    while let Some(event) = events.recv().await {
        let written = match event {
            WorkerEvent::Launching { argv, printed, .. } => {
                report.dispatched += 1;
                let written = writeln!(out, "{}", format_launch(&argv)).and_then(|()| out.flush());
                // Release the worker even if the write failed.
                let _ = printed.send(());
                written
            },
            WorkerEvent::Completed(outcome) => {
                match outcome.result.error() {
                    None => report.succeeded += 1,
                    Some(err) => {
                        report.failed += 1;
                        if err.is_launch_failure() {
                            report.launch_failures += 1;
                        }
                    },
                }
                write_completion(&mut out, &outcome)
            },
        };

        if let Err(e) = written {
            if !write_failed {
                tracing::warn!("failed to write sweep output: {e}");
                write_failed = true;
            }
        }
    }

    let _ = out.flush();
    report
}

fn write_completion(out: &mut OutputSink, outcome: &TaskOutcome) -> std::io::Result<()> {
    let stdout = &outcome.result.stdout;
    out.write_all(stdout)?;
    if !stdout.is_empty() && !stdout.ends_with(b"\n") {
        writeln!(out)?;
    }
    writeln!(out, "{}", format_completion(outcome))
}
