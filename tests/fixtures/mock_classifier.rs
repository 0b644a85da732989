//! Stand-in for the external classifier, used by integration tests.
//!
//! Prints its arguments and a fake score for the last argument (the sweep
//! value). Leading `--key=value` arguments tune its behavior:
//! - `--sleep-ms=N`: sleep this long before exiting
//! - `--fail-value=V`: exit with status 3 when the sweep value equals `V`
//! - `--track-dir=D`: register as running in `D` and record how many
//!   instances were running at the same time
//!
//! When `SWEEP_OUTPUT_PATH` is set, the sweep value is written to that file.
//!
//! Dependency-free on purpose.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Default)]
struct Options {
    sleep_ms: u64,
    fail_value: Option<String>,
    track_dir: Option<PathBuf>,
}

fn parse_options(args: &[String]) -> Options {
    let mut options = Options::default();
    for arg in args {
        if let Some(v) = arg.strip_prefix("--sleep-ms=") {
            options.sleep_ms = v.parse().expect("--sleep-ms takes an integer");
        } else if let Some(v) = arg.strip_prefix("--fail-value=") {
            options.fail_value = Some(v.to_string());
        } else if let Some(v) = arg.strip_prefix("--track-dir=") {
            options.track_dir = Some(PathBuf::from(v));
        }
    }
    options
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_options(&args);
    let value = args.last().cloned().unwrap_or_default();
    let pid = std::process::id();

    let marker = options.track_dir.as_ref().map(|dir| {
        let marker = dir.join(format!("running-{pid}"));
        std::fs::write(&marker, &value).expect("write running marker");
        let running = std::fs::read_dir(dir)
            .expect("read track dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("running-"))
            .count();
        std::fs::write(dir.join(format!("observed-{pid}")), running.to_string())
            .expect("write observation");
        marker
    });

    if options.sleep_ms > 0 {
        std::thread::sleep(Duration::from_millis(options.sleep_ms));
    }

    if let Some(path) = std::env::var_os("SWEEP_OUTPUT_PATH") {
        std::fs::write(path, &value).expect("write output file");
    }

    println!("args: {}", args.join(" "));
    println!("score for {value}: 0.5");

    if let Some(marker) = marker {
        std::fs::remove_file(marker).expect("remove running marker");
    }

    if options.fail_value.as_deref() == Some(value.as_str()) {
        eprintln!("mock classifier: refusing value {value}");
        std::process::exit(3);
    }
}
