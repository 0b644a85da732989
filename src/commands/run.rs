//! `param-sweep run` command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::IsTerminal;

use param_sweep::sweep::dispatcher::run_sweep;
use param_sweep::sweep::report::SweepReport;

use super::SweepArgs;

/// Execute the `run` command.
///
/// Resolves the config, builds the runtime it asks for, runs the sweep to
/// completion and prints a summary. Task failures do not make this return an
/// error.
pub fn execute(args: SweepArgs, no_color: bool) -> Result<()> {
    let config = args.resolve()?;

    let runtime = config
        .runtime
        .build_runtime()
        .context("Failed to build sweep runtime")?;
    let report = runtime
        .block_on(run_sweep(&config, Box::new(std::io::stdout())))
        .context("Sweep failed")?;

    if no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
    println!("{}", render_summary(&report));

    Ok(())
}

/// Render the end-of-sweep summary block.
fn render_summary(report: &SweepReport) -> String {
    let failed = if report.failed == 0 {
        report.failed.to_string().green()
    } else {
        report.failed.to_string().red()
    };
    let mut lines = vec![
        format!("{}", "Sweep finished".bold()),
        format!("  tasks:            {}", report.completed()),
        format!("  succeeded:        {}", report.succeeded.to_string().green()),
        format!("  failed:           {failed}"),
    ];
    if report.launch_failures > 0 {
        lines.push(format!(
            "  launch failures:  {}",
            report.launch_failures.to_string().red()
        ));
    }
    lines.push(format!("  peak concurrency: {}", report.peak_concurrency));
    lines.push(format!("  elapsed:          {:.2?}", report.elapsed));
    lines.join("\n")
}
