//! Error types for the sweep orchestrator.
//!
//! [`SweepError`] covers configuration and startup failures, which are fatal.
//! [`TaskError`] covers the outcome of a single external-process invocation,
//! which is always recovered locally and never aborts the sweep.

/// Errors that occur while loading, validating, or starting a sweep.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// TOML parse failure: the config file contains invalid TOML syntax
    /// or does not match the expected schema.
    #[error("Failed to parse config TOML: {source}")]
    ConfigParse {
        #[from]
        source: toml::de::Error,
    },

    /// Semantic validation failure: the config parsed but contains invalid
    /// values (e.g., zero pool capacity, empty binary path).
    #[error("Config validation error: {message}")]
    ConfigValidation { message: String },

    /// The config file could not be read from disk.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigIo {
        source: std::io::Error,
        path: String,
    },

    /// The async runtime could not be built.
    #[error("Failed to start runtime: {message}")]
    Runtime { message: String },
}

impl SweepError {
    /// Shorthand for a [`SweepError::ConfigValidation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}

/// Failure of a single task's external-process invocation.
///
/// Each variant is recorded against its task and printed; none of them
/// cancel sibling tasks.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The external binary could not be started (missing executable,
    /// permission denied, ...).
    #[error("failed to launch: {message}")]
    Launch { message: String },

    /// The external binary ran and exited with a failure status.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    #[error("exited with {}", describe_code(*code))]
    NonZeroExit { code: Option<i32> },

    /// The task runner panicked while executing the task.
    #[error("runner panicked: {message}")]
    Panicked { message: String },
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl TaskError {
    /// Returns the error category as a static string for completion accounting.
    ///
    /// Categories: `"launch"`, `"exit"`, `"panic"`.
    pub fn error_category(&self) -> &'static str {
        match self {
            Self::Launch { .. } => "launch",
            Self::NonZeroExit { .. } => "exit",
            Self::Panicked { .. } => "panic",
        }
    }

    /// Returns `true` if the process never started.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_launch() {
        let err = TaskError::Launch {
            message: "No such file or directory".to_string(),
        };
        assert_eq!(err.error_category(), "launch");
        assert!(err.is_launch_failure());
    }

    #[test]
    fn test_error_category_exit() {
        let err = TaskError::NonZeroExit { code: Some(3) };
        assert_eq!(err.error_category(), "exit");
        assert!(!err.is_launch_failure());
    }

    #[test]
    fn test_error_category_panic() {
        let err = TaskError::Panicked {
            message: "boom".to_string(),
        };
        assert_eq!(err.error_category(), "panic");
        assert_eq!(err.to_string(), "runner panicked: boom");
    }

    #[test]
    fn test_non_zero_exit_display() {
        assert_eq!(
            TaskError::NonZeroExit { code: Some(2) }.to_string(),
            "exited with status 2"
        );
        assert_eq!(
            TaskError::NonZeroExit { code: None }.to_string(),
            "exited with no status (terminated by signal)"
        );
    }

    #[test]
    fn test_validation_shorthand() {
        let err = SweepError::validation("capacity must be at least 1");
        assert!(matches!(err, SweepError::ConfigValidation { .. }));
        assert_eq!(
            err.to_string(),
            "Config validation error: capacity must be at least 1"
        );
    }
}
