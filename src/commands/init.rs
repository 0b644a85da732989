//! `param-sweep init` command implementation.

use anyhow::{Context, Result};
use std::path::Path;

use param_sweep::sweep::config::SweepConfig;

use super::CONFIG_FILE_NAME;

const HEADER: &str = "\
# param-sweep configuration.
#
# Each task runs: <binary_path> <fixed_args...> <value>
# for value = start, start + step, ... while value < end.
# Set invocation.output_path_template (must contain {value}) to give each
# task its own output path via the SWEEP_OUTPUT_PATH environment variable.

";

/// Execute the `init` command in the current directory.
pub fn execute(force: bool) -> Result<()> {
    let path = std::env::current_dir()?.join(CONFIG_FILE_NAME);
    write_starter_config(&path, force)?;
    eprintln!("Created {}", path.display());
    eprintln!("Edit the file to point at your classifier binary and inputs.");
    Ok(())
}

/// Write the reference configuration to `path`, refusing to overwrite an
/// existing file unless `force` is set.
fn write_starter_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}\n\
             Use `--force` to overwrite.",
            path.display()
        );
    }
    let body = SweepConfig::default().to_toml()?;
    std::fs::write(path, format!("{HEADER}{body}"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
