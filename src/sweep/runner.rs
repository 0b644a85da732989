//! Task execution: launching the external binary for one task.
//!
//! [`TaskRunner`] is the seam between the pool and the outside world. The
//! dispatcher only ever sees a [`ProcessResult`]; [`ProcessRunner`] is the
//! production implementation backed by `tokio::process`.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};

use crate::sweep::config::{InvocationSettings, StderrPolicy, OUTPUT_PATH_ENV};
use crate::sweep::error::TaskError;
use crate::sweep::task::Task;

/// Captured result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Everything the process wrote to stdout.
    pub stdout: Vec<u8>,
    /// `Ok` on a zero exit status, otherwise why the task failed.
    pub status: Result<(), TaskError>,
}

impl ProcessResult {
    /// A successful result with the given stdout.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            status: Ok(()),
        }
    }

    /// A failed result with whatever stdout was captured.
    pub fn failure(stdout: impl Into<Vec<u8>>, error: TaskError) -> Self {
        Self {
            stdout: stdout.into(),
            status: Err(error),
        }
    }

    /// Builds a result from a finished process.
    pub fn from_exit(stdout: Vec<u8>, status: ExitStatus) -> Self {
        if status.success() {
            Self::success(stdout)
        } else {
            Self::failure(
                stdout,
                TaskError::NonZeroExit {
                    code: status.code(),
                },
            )
        }
    }

    /// Returns `true` if the process ran and exited with status zero.
    pub fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    /// The task error, if any.
    pub fn error(&self) -> Option<&TaskError> {
        self.status.as_ref().err()
    }

    /// Captured stdout decoded lossily as UTF-8.
    pub fn stdout_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }
}

/// Executes one task to completion.
///
/// Implementations must not panic on process failure; every outcome is
/// expressed as a [`ProcessResult`].
#[async_trait]
pub trait TaskRunner: Send + Sync + 'static {
    /// Run `task` and wait for it to finish.
    async fn run(&self, task: &Task) -> ProcessResult;
}

/// Runs each task as a child process of the external binary.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    stderr: StderrPolicy,
}

impl ProcessRunner {
    /// Creates a runner with the given stderr policy.
    pub fn new(stderr: StderrPolicy) -> Self {
        Self { stderr }
    }

    /// Creates a runner from the `[invocation]` settings.
    pub fn from_settings(settings: &InvocationSettings) -> Self {
        Self::new(settings.stderr)
    }

    fn stderr_stdio(&self) -> Stdio {
        match self.stderr {
            StderrPolicy::Inherit => Stdio::inherit(),
            StderrPolicy::Discard => Stdio::null(),
        }
    }
}

#[async_trait]
impl TaskRunner for ProcessRunner {
    async fn run(&self, task: &Task) -> ProcessResult {
        let mut command = tokio::process::Command::new(task.program());
        command
            .args(task.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(self.stderr_stdio());
        if let Some(path) = task.output_path() {
            command.env(OUTPUT_PATH_ENV, path);
        }

        match command.output().await {
            Ok(output) => ProcessResult::from_exit(output.stdout, output.status),
            Err(e) => ProcessResult::failure(
                Vec::new(),
                TaskError::Launch {
                    message: format!("{}: {e}", task.program()),
                },
            ),
        }
    }
}
