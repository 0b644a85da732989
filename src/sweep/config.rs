//! TOML-based sweep configuration.
//!
//! Every section and field is optional; an empty file describes the reference
//! sweep (64 workers over `0.00001..1` in steps of `0.00005`).
//!
//! # Example TOML
//!
//! ```toml
//! [sweep]
//! start = 0.00001
//! end = 1.0
//! step = 0.00005
//!
//! [pool]
//! capacity = 64
//!
//! [invocation]
//! binary_path = "./main.out"
//! fixed_args = ["wordToClassCount.mtx", "../vocabulary.txt", "../newsgrouplabels.txt", "customTest.csv"]
//! stderr = "inherit"
//! output_path_template = "results/out-{value}.txt"
//!
//! [runtime]
//! flavor = "multi-thread"
//! worker_threads = 8
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::sweep::error::SweepError;
use crate::sweep::range::SweepRange;
use crate::sweep::task::{InvocationTemplate, TaskGenerator, VALUE_PLACEHOLDER};

/// Reference pool capacity.
pub const DEFAULT_CAPACITY: usize = 64;

/// Reference external binary.
pub const DEFAULT_BINARY_PATH: &str = "./main.out";

/// Reference fixed arguments, in invocation order.
pub const DEFAULT_FIXED_ARGS: [&str; 4] = [
    "wordToClassCount.mtx",
    "../vocabulary.txt",
    "../newsgrouplabels.txt",
    "customTest.csv",
];

/// Environment variable carrying the per-task output path to the child.
pub const OUTPUT_PATH_ENV: &str = "SWEEP_OUTPUT_PATH";

/// Top-level sweep configuration parsed from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Values to sweep.
    #[serde(default)]
    pub sweep: SweepRange,
    /// Worker pool settings.
    #[serde(default)]
    pub pool: PoolSettings,
    /// How each task's process is launched.
    #[serde(default)]
    pub invocation: InvocationSettings,
    /// Process-wide runtime start policy.
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSettings {
    /// Number of workers, and therefore the maximum number of concurrently
    /// running processes. Fixed for the lifetime of the pool.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// What happens to a child process's standard error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StderrPolicy {
    /// Stay connected to the orchestrator's own stderr.
    #[default]
    Inherit,
    /// Discard it.
    Discard,
}

/// External binary invocation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InvocationSettings {
    /// Path of the external binary.
    #[serde(default = "default_binary_path")]
    pub binary_path: String,
    /// Arguments placed between the binary and the sweep value, in order.
    #[serde(default = "default_fixed_args")]
    pub fixed_args: Vec<String>,
    /// Child stderr handling.
    #[serde(default)]
    pub stderr: StderrPolicy,
    /// Optional per-task output path. Must contain `{value}`; the rendered
    /// path is exported to the child as `SWEEP_OUTPUT_PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path_template: Option<String>,
}

fn default_binary_path() -> String {
    DEFAULT_BINARY_PATH.to_string()
}

fn default_fixed_args() -> Vec<String> {
    DEFAULT_FIXED_ARGS.iter().map(|s| s.to_string()).collect()
}

impl Default for InvocationSettings {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            fixed_args: default_fixed_args(),
            stderr: StderrPolicy::default(),
            output_path_template: None,
        }
    }
}

/// Tokio runtime flavor used to host the worker pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeFlavor {
    /// Work-stealing scheduler over several OS threads.
    #[default]
    MultiThread,
    /// Everything on the calling thread. Child processes still run in
    /// parallel; only the bookkeeping is single-threaded.
    CurrentThread,
}

/// Process-wide start policy, applied once when the runtime is built.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSettings {
    /// Scheduler flavor.
    #[serde(default)]
    pub flavor: RuntimeFlavor,
    /// Worker thread count for the multi-thread flavor (tokio default if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
}

impl RuntimeSettings {
    /// Builds the tokio runtime described by these settings.
    pub fn build_runtime(&self) -> Result<tokio::runtime::Runtime, SweepError> {
        let mut builder = match self.flavor {
            RuntimeFlavor::MultiThread => {
                let mut builder = tokio::runtime::Builder::new_multi_thread();
                if let Some(threads) = self.worker_threads {
                    builder.worker_threads(threads);
                }
                builder
            },
            RuntimeFlavor::CurrentThread => tokio::runtime::Builder::new_current_thread(),
        };
        builder
            .enable_all()
            .build()
            .map_err(|e| SweepError::Runtime {
                message: e.to_string(),
            })
    }
}

impl SweepConfig {
    /// Parse a TOML string into a validated [`SweepConfig`].
    pub fn from_toml(content: &str) -> Result<Self, SweepError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a [`SweepConfig`] from a file path.
    ///
    /// Returns [`SweepError::ConfigIo`] if the file cannot be read,
    /// [`SweepError::ConfigParse`] if the TOML is malformed, or
    /// [`SweepError::ConfigValidation`] if validation fails.
    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let content = std::fs::read_to_string(path).map_err(|source| SweepError::ConfigIo {
            source,
            path: path.display().to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Serialize back to TOML (used by `init`).
    pub fn to_toml(&self) -> Result<String, SweepError> {
        toml::to_string_pretty(self).map_err(|e| SweepError::validation(e.to_string()))
    }

    /// Validate that the config is semantically correct.
    ///
    /// An empty or inverted sweep range is accepted: it is a no-op sweep,
    /// not an error. Non-finite bounds are rejected since they can only come
    /// from a typo.
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.pool.capacity == 0 {
            return Err(SweepError::validation(
                "pool.capacity must be at least 1",
            ));
        }

        let range = &self.sweep;
        for (name, value) in [("start", range.start), ("end", range.end), ("step", range.step)] {
            if !value.is_finite() {
                return Err(SweepError::validation(format!(
                    "sweep.{name} must be a finite number, got {value}"
                )));
            }
        }

        if self.invocation.binary_path.trim().is_empty() {
            return Err(SweepError::validation(
                "invocation.binary_path must not be empty",
            ));
        }

        if let Some(template) = &self.invocation.output_path_template {
            if !template.contains(VALUE_PLACEHOLDER) {
                return Err(SweepError::validation(format!(
                    "invocation.output_path_template '{template}' must contain {VALUE_PLACEHOLDER} \
                     so concurrent tasks write to distinct paths"
                )));
            }
        }

        if self.runtime.worker_threads == Some(0) {
            return Err(SweepError::validation(
                "runtime.worker_threads must be at least 1",
            ));
        }

        Ok(())
    }

    /// The invocation shared by all tasks of this sweep.
    pub fn template(&self) -> Arc<InvocationTemplate> {
        Arc::new(
            InvocationTemplate::new(
                self.invocation.binary_path.clone(),
                self.invocation.fixed_args.clone(),
            )
            .with_output_path_template(self.invocation.output_path_template.clone()),
        )
    }

    /// A fresh, lazy task sequence for this sweep.
    pub fn tasks(&self) -> TaskGenerator {
        TaskGenerator::new(&self.sweep, self.template())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_reference() {
        let config = SweepConfig::from_toml("").unwrap();
        assert_eq!(config, SweepConfig::default());
        assert_eq!(config.pool.capacity, 64);
        assert_eq!(config.sweep.start, 0.00001);
        assert_eq!(config.sweep.end, 1.0);
        assert_eq!(config.sweep.step, 0.00005);
        assert_eq!(config.invocation.binary_path, "./main.out");
        assert_eq!(config.invocation.fixed_args.len(), 4);
        assert_eq!(config.invocation.stderr, StderrPolicy::Inherit);
        assert_eq!(config.runtime.flavor, RuntimeFlavor::MultiThread);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[sweep]
start = 0.1
end = 0.3
step = 0.1

[pool]
capacity = 2

[invocation]
binary_path = "/usr/bin/classifier"
fixed_args = ["a.mtx", "b.txt"]
stderr = "discard"
output_path_template = "out/{value}.csv"

[runtime]
flavor = "current-thread"
"#;
        let config = SweepConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.sweep, SweepRange::new(0.1, 0.3, 0.1));
        assert_eq!(config.pool.capacity, 2);
        assert_eq!(config.invocation.binary_path, "/usr/bin/classifier");
        assert_eq!(config.invocation.fixed_args, vec!["a.mtx", "b.txt"]);
        assert_eq!(config.invocation.stderr, StderrPolicy::Discard);
        assert_eq!(
            config.invocation.output_path_template.as_deref(),
            Some("out/{value}.csv")
        );
        assert_eq!(config.runtime.flavor, RuntimeFlavor::CurrentThread);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config = SweepConfig::from_toml("[sweep]\nstep = 0.5\n").unwrap();
        assert_eq!(config.sweep.start, 0.00001);
        assert_eq!(config.sweep.step, 0.5);
        assert_eq!(config.pool.capacity, 64);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SweepConfig::from_toml("[pool]\ncapacity = 0\n").unwrap_err();
        match err {
            SweepError::ConfigValidation { message } => {
                assert!(message.contains("capacity"), "got: {message}");
            },
            other => panic!("Expected ConfigValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_range_is_not_an_error() {
        let config = SweepConfig::from_toml("[sweep]\nstart = 2.0\nend = 1.0\n").unwrap();
        assert_eq!(config.tasks().count(), 0);
    }

    #[test]
    fn test_non_finite_range_rejected() {
        let err = SweepConfig::from_toml("[sweep]\nend = inf\n").unwrap_err();
        assert!(matches!(err, SweepError::ConfigValidation { .. }));
    }

    #[test]
    fn test_empty_binary_rejected() {
        let err = SweepConfig::from_toml("[invocation]\nbinary_path = \"  \"\n").unwrap_err();
        assert!(matches!(err, SweepError::ConfigValidation { .. }));
    }

    #[test]
    fn test_output_template_requires_placeholder() {
        let err =
            SweepConfig::from_toml("[invocation]\noutput_path_template = \"out.txt\"\n").unwrap_err();
        match err {
            SweepError::ConfigValidation { message } => {
                assert!(message.contains("{value}"), "got: {message}");
            },
            other => panic!("Expected ConfigValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_worker_threads_rejected() {
        let err = SweepConfig::from_toml("[runtime]\nworker_threads = 0\n").unwrap_err();
        assert!(matches!(err, SweepError::ConfigValidation { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SweepConfig::from_toml("[pool]\nsize = 4\n").unwrap_err();
        assert!(matches!(err, SweepError::ConfigParse { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let err = SweepConfig::from_toml("[sweep\nstart = ").unwrap_err();
        assert!(matches!(err, SweepError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pool]\ncapacity = 3").unwrap();
        let config = SweepConfig::load(file.path()).unwrap();
        assert_eq!(config.pool.capacity, 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SweepConfig::load(Path::new("/nonexistent/sweep.toml")).unwrap_err();
        match err {
            SweepError::ConfigIo { path, .. } => assert_eq!(path, "/nonexistent/sweep.toml"),
            other => panic!("Expected ConfigIo, got {other:?}"),
        }
    }

    #[test]
    fn test_to_toml_roundtrips() {
        let config = SweepConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(SweepConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_tasks_use_configured_invocation() {
        let config = SweepConfig::from_toml(
            "[sweep]\nstart = 0.1\nend = 0.3\nstep = 0.1\n[invocation]\nbinary_path = \"bin\"\nfixed_args = [\"x\"]\n",
        )
        .unwrap();
        let argvs: Vec<Vec<String>> = config.tasks().map(|t| t.argv()).collect();
        assert_eq!(argvs, vec![vec!["bin", "x", "0.1"], vec!["bin", "x", "0.2"]]);
    }

    #[test]
    fn test_build_current_thread_runtime() {
        let settings = RuntimeSettings {
            flavor: RuntimeFlavor::CurrentThread,
            worker_threads: None,
        };
        let runtime = settings.build_runtime().unwrap();
        assert_eq!(runtime.block_on(async { 1 + 1 }), 2);
    }
}
