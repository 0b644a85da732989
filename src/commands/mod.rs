//! CLI subcommands.
//!
//! `run` and `plan` share [`SweepArgs`]: an optional config file plus flag
//! and environment overrides applied on top of it.

pub mod init;
pub mod plan;
pub mod run;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use param_sweep::sweep::config::{RuntimeFlavor, StderrPolicy, SweepConfig};

/// Name of the config file discovered from the working directory upwards.
pub const CONFIG_FILE_NAME: &str = "sweep.toml";

/// Config source and overrides shared by sweep-running commands.
#[derive(Debug, Default, Args)]
pub struct SweepArgs {
    /// Path to config file (default: auto-discover sweep.toml)
    #[arg(long, env = "SWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// First sweep value (overrides config)
    #[arg(long, env = "SWEEP_START", allow_negative_numbers = true)]
    pub start: Option<f64>,

    /// Exclusive upper bound (overrides config)
    #[arg(long, env = "SWEEP_END", allow_negative_numbers = true)]
    pub end: Option<f64>,

    /// Increment between values (overrides config)
    #[arg(long, env = "SWEEP_STEP", allow_negative_numbers = true)]
    pub step: Option<f64>,

    /// Worker pool size (overrides config)
    #[arg(long, env = "SWEEP_CAPACITY")]
    pub capacity: Option<usize>,

    /// External binary to launch (overrides config)
    #[arg(long, env = "SWEEP_BINARY")]
    pub binary: Option<String>,

    /// Child stderr handling (overrides config)
    #[arg(long, value_enum, env = "SWEEP_STDERR")]
    pub stderr: Option<StderrPolicy>,

    /// Per-task output path containing {value}, exported as SWEEP_OUTPUT_PATH
    #[arg(long, env = "SWEEP_OUTPUT_TEMPLATE")]
    pub output_template: Option<String>,

    /// Runtime flavor (overrides config)
    #[arg(long, value_enum, env = "SWEEP_RUNTIME")]
    pub runtime: Option<RuntimeFlavor>,

    /// Fixed arguments placed before the sweep value (replace the config's)
    #[arg(last = true)]
    pub fixed_args: Vec<String>,
}

impl SweepArgs {
    /// Loads the config (explicit path, discovered file, or reference
    /// defaults), applies overrides and validates the result.
    pub fn resolve(&self) -> Result<SweepConfig> {
        let mut config = match self.config_path()? {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                SweepConfig::load(&path)
                    .with_context(|| format!("Failed to load config '{}'", path.display()))?
            },
            None => {
                tracing::info!("No {CONFIG_FILE_NAME} found, using reference configuration");
                SweepConfig::default()
            },
        };

        self.apply_overrides(&mut config);
        config.validate().context("Invalid sweep configuration")?;
        Ok(config)
    }

    fn config_path(&self) -> Result<Option<PathBuf>> {
        match &self.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!(
                        "Config file not found: {}\nUse `param-sweep init` to create one.",
                        path.display()
                    );
                }
                Ok(Some(path.clone()))
            },
            None => Ok(discover_config()),
        }
    }

    /// Apply flag overrides to a loaded config.
    fn apply_overrides(&self, config: &mut SweepConfig) {
        if let Some(start) = self.start {
            config.sweep.start = start;
        }
        if let Some(end) = self.end {
            config.sweep.end = end;
        }
        if let Some(step) = self.step {
            config.sweep.step = step;
        }
        if let Some(capacity) = self.capacity {
            config.pool.capacity = capacity;
        }
        if let Some(binary) = &self.binary {
            config.invocation.binary_path = binary.clone();
        }
        if let Some(stderr) = self.stderr {
            config.invocation.stderr = stderr;
        }
        if let Some(template) = &self.output_template {
            config.invocation.output_path_template = Some(template.clone());
        }
        if let Some(flavor) = self.runtime {
            config.runtime.flavor = flavor;
        }
        if !self.fixed_args.is_empty() {
            config.invocation.fixed_args = self.fixed_args.clone();
        }
    }
}

/// Discover `sweep.toml` by walking parent directories from the current
/// working directory.
fn discover_config() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
