//! Fixed-size worker pool dispatcher.
//!
//! [`Dispatcher`] is the top-level orchestrator that:
//! - Spawns exactly `capacity` workers via [`tokio_util::task::TaskTracker`]
//! - Feeds them lazily through a bounded queue, so memory stays
//!   proportional to `capacity` rather than to the sweep length
//! - Forwards launch/completion events to the reporter over a bounded mpsc
//!   channel
//! - Returns only after every task has completed and its output has been
//!   written

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio_util::task::TaskTracker;

use crate::sweep::config::SweepConfig;
use crate::sweep::error::SweepError;
use crate::sweep::report::{reporter_loop, OutputSink, SweepReport};
use crate::sweep::runner::{ProcessRunner, TaskRunner};
use crate::sweep::task::Task;
use crate::sweep::worker::{worker_loop, PoolCounters, TaskState, WorkerEvent};

/// Launch + completion events buffered per worker before workers block on
/// the reporter.
const EVENTS_PER_WORKER: usize = 4;

/// Upper bound on any channel buffer, whatever the pool size.
const MAX_CHANNEL_BUFFER: usize = 1 << 16;

/// Runs tasks on a fixed pool of `capacity` workers.
pub struct Dispatcher<R: TaskRunner> {
    capacity: usize,
    runner: Arc<R>,
    counters: PoolCounters,
}

impl Dispatcher<ProcessRunner> {
    /// Creates a dispatcher that launches the external binary described by
    /// `config`.
    pub fn from_config(config: &SweepConfig) -> Result<Self, SweepError> {
        Self::new(
            config.pool.capacity,
            ProcessRunner::from_settings(&config.invocation),
        )
    }
}

impl<R: TaskRunner> Dispatcher<R> {
    /// Creates a dispatcher with `capacity` workers executing tasks through
    /// `runner`.
    ///
    /// Returns [`SweepError::ConfigValidation`] if `capacity` is zero.
    pub fn new(capacity: usize, runner: R) -> Result<Self, SweepError> {
        if capacity == 0 {
            return Err(SweepError::validation("pool capacity must be at least 1"));
        }
        Ok(Self {
            capacity,
            runner: Arc::new(runner),
            counters: PoolCounters::new(),
        })
    }

    /// Number of workers in the pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Live pool counters. Cumulative across runs of this dispatcher, except
    /// the peak, which restarts with each run.
    pub fn counters(&self) -> &PoolCounters {
        &self.counters
    }

    /// Runs every task, printing to stdout.
    pub async fn run<I>(&self, tasks: I) -> SweepReport
    where
        I: IntoIterator<Item = Task>,
    {
        self.run_with_output(tasks, Box::new(std::io::stdout())).await
    }

    /// Runs every task, writing launch lines and captured output to `out`.
    ///
    /// A task's launch line is written to `out` before its runner is
    /// invoked. Tasks are pulled from `tasks` one at a time as queue space frees up
    /// and handed to workers in emission order. Failed tasks are recorded in
    /// the report and never stop the sweep.
    pub async fn run_with_output<I>(&self, tasks: I, out: OutputSink) -> SweepReport
    where
        I: IntoIterator<Item = Task>,
    {
        let started = Instant::now();
        tracing::info!(capacity = self.capacity, "starting sweep");
        self.counters.reset_peak();

        let queue_len = self.capacity.min(MAX_CHANNEL_BUFFER);
        let event_len = self
            .capacity
            .saturating_mul(EVENTS_PER_WORKER)
            .min(MAX_CHANNEL_BUFFER);
        let (task_tx, task_rx) = mpsc::channel::<Task>(queue_len);
        let queue = Arc::new(Mutex::new(task_rx));
        let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>(event_len);

        // Reporter runs outside the tracker: it must outlive every worker.
        let reporter = tokio::spawn(reporter_loop(event_rx, out));

        let tracker = TaskTracker::new();
        for worker_id in 0..self.capacity {
            tracker.spawn(worker_loop(
                worker_id,
                queue.clone(),
                self.runner.clone(),
                event_tx.clone(),
                self.counters.clone(),
            ));
        }
        // Workers hold their own clones.
        drop(event_tx);
        drop(queue);
        tracker.close();

        let mut produced: u64 = 0;
        for task in tasks {
            tracing::trace!(
                task = task.index(),
                param = task.param(),
                state = ?TaskState::Generated,
                "task state"
            );
            if task_tx.send(task).await.is_err() {
                tracing::error!(produced, "all workers exited early; stopping task production");
                break;
            }
            produced += 1;
        }
        // Closing the queue lets workers exit once it is drained.
        drop(task_tx);

        tracker.wait().await;

        let mut report = match reporter.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("reporter task failed: {e}");
                SweepReport::default()
            },
        };
        report.peak_concurrency = self.counters.peak_in_flight();
        report.elapsed = started.elapsed();

        if produced == 0 {
            tracing::warn!("sweep produced no tasks");
        }
        tracing::info!(
            produced,
            succeeded = report.succeeded,
            failed = report.failed,
            peak_concurrency = report.peak_concurrency,
            elapsed = ?report.elapsed,
            "sweep finished"
        );
        report
    }
}

/// Runs the sweep described by `config` against the external binary,
/// writing output to `out`.
///
/// Fails only on invalid configuration; individual task failures are
/// reported in the returned [`SweepReport`].
pub async fn run_sweep(config: &SweepConfig, out: OutputSink) -> Result<SweepReport, SweepError> {
    config.validate()?;
    if config.sweep.is_empty() {
        tracing::warn!(
            start = config.sweep.start,
            end = config.sweep.end,
            step = config.sweep.step,
            "sweep range is empty (requires step > 0 and start < end)"
        );
    }
    let dispatcher = Dispatcher::from_config(config)?;
    Ok(dispatcher.run_with_output(config.tasks(), out).await)
}
