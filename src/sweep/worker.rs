//! Worker loop and pool bookkeeping.
//!
//! Workers share one receiver behind a fair mutex: whichever free worker
//! queued for the lock first takes the next task, so tasks are assigned in
//! emission order. Each worker runs its task to completion before asking for
//! another one.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::sweep::error::TaskError;
use crate::sweep::runner::{ProcessResult, TaskRunner};
use crate::sweep::task::Task;

/// Shared, clone-friendly queue handle the workers pull from.
pub type TaskQueue = Arc<Mutex<mpsc::Receiver<Task>>>;

/// Lifecycle of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Produced by the generator, waiting in the queue.
    Generated,
    /// Taken from the queue by a worker.
    Assigned,
    /// The external process has been launched.
    Running,
    /// The process finished (successfully or not).
    Completed { success: bool },
}

/// Atomic counters describing pool activity.
///
/// Updated by workers, read by the dispatcher and the live summary.
#[derive(Clone, Default)]
pub struct PoolCounters(Arc<PoolCountersInner>);

#[derive(Default)]
struct PoolCountersInner {
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    assigned: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl PoolCounters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a worker took a task off the queue.
    pub fn task_assigned(&self) {
        self.0.assigned.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a task starting to run and updates the peak.
    pub fn task_started(&self) {
        let now = self.0.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    /// Restarts peak tracking from the current in-flight count.
    pub fn reset_peak(&self) {
        let now = self.0.in_flight.load(Ordering::SeqCst);
        self.0.peak_in_flight.store(now, Ordering::SeqCst);
    }

    /// Records a task reaching a terminal state.
    pub fn task_finished(&self, success: bool) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.0.completed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.0.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Tasks currently running.
    pub fn in_flight(&self) -> usize {
        self.0.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running tasks observed.
    pub fn peak_in_flight(&self) -> usize {
        self.0.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Tasks handed to a worker so far.
    pub fn assigned(&self) -> u64 {
        self.0.assigned.load(Ordering::Relaxed)
    }

    /// Tasks that reached a terminal state.
    pub fn completed(&self) -> u64 {
        self.0.completed.load(Ordering::Relaxed)
    }

    /// Completed tasks that failed.
    pub fn failed(&self) -> u64 {
        self.0.failed.load(Ordering::Relaxed)
    }
}

/// Event emitted by workers for the reporter.
#[derive(Debug)]
pub enum WorkerEvent {
    /// A task is about to launch. The worker holds the launch until
    /// `printed` fires or is dropped.
    Launching {
        /// Worker that owns the task.
        worker_id: usize,
        /// The task's full argument vector.
        argv: Vec<String>,
        /// Signalled once the argument vector has been written out.
        printed: oneshot::Sender<()>,
    },
    /// A task finished.
    Completed(TaskOutcome),
}

/// Terminal record of one task.
#[derive(Debug)]
pub struct TaskOutcome {
    /// Worker that ran the task.
    pub worker_id: usize,
    /// The task itself.
    pub task: Task,
    /// What the process produced.
    pub result: ProcessResult,
    /// Wall-clock time from launch to exit.
    pub elapsed: Duration,
}

/// Main worker loop.
///
/// Pulls tasks until the queue is closed and drained. Runner failures are
/// reported as failed outcomes; the loop never stops early because of them.
/// If the reporter goes away the worker still finishes its queue so that
/// every generated task is executed exactly once.
pub async fn worker_loop<R: TaskRunner>(
    worker_id: usize,
    queue: TaskQueue,
    runner: Arc<R>,
    events: mpsc::Sender<WorkerEvent>,
    counters: PoolCounters,
) {
    tracing::debug!(worker_id, "worker started");

    loop {
        // Hold the lock only while waiting for the next task.
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(task) = next else {
            break;
        };

        counters.task_assigned();
        trace_state(worker_id, &task, TaskState::Assigned);

        // The argv line must be out before the process exists.
        let (printed, launch_line_written) = oneshot::channel();
        let launch = WorkerEvent::Launching {
            worker_id,
            argv: task.argv(),
            printed,
        };
        if events.send(launch).await.is_ok() {
            let _ = launch_line_written.await;
        }

        counters.task_started();
        trace_state(worker_id, &task, TaskState::Running);
        let start = Instant::now();
        let result = match AssertUnwindSafe(runner.run(&task)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => ProcessResult::failure(
                Vec::new(),
                TaskError::Panicked {
                    message: panic_message(panic.as_ref()),
                },
            ),
        };
        let elapsed = start.elapsed();
        let success = result.is_success();
        counters.task_finished(success);
        trace_state(worker_id, &task, TaskState::Completed { success });

        if let Some(err) = result.error() {
            tracing::warn!(
                worker_id,
                task = task.index(),
                param = task.param(),
                category = err.error_category(),
                "task failed: {err}"
            );
        }

        let _ = events
            .send(WorkerEvent::Completed(TaskOutcome {
                worker_id,
                task,
                result,
                elapsed,
            }))
            .await;
    }

    tracing::debug!(worker_id, "worker finished");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn trace_state(worker_id: usize, task: &Task, state: TaskState) {
    tracing::debug!(
        worker_id,
        task = task.index(),
        param = task.param(),
        ?state,
        "task state"
    );
}
