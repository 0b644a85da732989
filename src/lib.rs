//! param-sweep: run an external binary once per value of a parameter sweep.
//!
//! The library exposes the sweep engine; the `param-sweep` binary wraps it in
//! a CLI.
//!
//! ```no_run
//! use param_sweep::sweep::config::SweepConfig;
//! use param_sweep::sweep::dispatcher::run_sweep;
//!
//! # async fn demo() -> Result<(), param_sweep::sweep::error::SweepError> {
//! let config = SweepConfig::from_toml("[sweep]\nstart = 0.1\nend = 0.3\nstep = 0.1\n")?;
//! let report = run_sweep(&config, Box::new(std::io::stdout())).await?;
//! println!("{} tasks, {} failed", report.completed(), report.failed);
//! # Ok(())
//! # }
//! ```

pub mod sweep;
