//! `param-sweep plan` command implementation.

use anyhow::Result;

use param_sweep::sweep::config::SweepConfig;
use param_sweep::sweep::range::SweepRange;
use param_sweep::sweep::report::format_launch;

use super::SweepArgs;

/// Values counted before `plan` stops walking the range.
const MAX_COUNTED_TASKS: usize = 10_000_000;

/// Execute the `plan` command: print the task count and the first `limit`
/// argument vectors without launching anything.
pub fn execute(args: SweepArgs, limit: usize) -> Result<()> {
    let config = args.resolve()?;
    for line in render_plan(&config, limit, MAX_COUNTED_TASKS) {
        println!("{line}");
    }
    Ok(())
}

/// Task count of `range`, or `None` if it has more than `cap` values.
fn count_tasks(range: &SweepRange, cap: usize) -> Option<usize> {
    let counted = range.iter().take(cap.saturating_add(1)).count();
    (counted <= cap).then_some(counted)
}

/// Header, up to `limit` argument vectors and a trailer for the rest.
fn render_plan(config: &SweepConfig, limit: usize, cap: usize) -> Vec<String> {
    let total = count_tasks(&config.sweep, cap);
    let total_text = match total {
        Some(total) => total.to_string(),
        None => format!("more than {cap}"),
    };

    let mut lines = vec![format!(
        "{total_text} tasks on {} workers ({} -> {} step {})",
        config.pool.capacity, config.sweep.start, config.sweep.end, config.sweep.step
    )];
    lines.extend(config.tasks().take(limit).map(|task| format_launch(&task.argv())));
    match total {
        Some(total) if total > limit => lines.push(format!("... and {} more", total - limit)),
        Some(_) => {},
        None => lines.push(format!("... and more than {} more", cap.saturating_sub(limit))),
    }
    lines
}
