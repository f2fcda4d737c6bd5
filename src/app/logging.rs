// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vigil::logfile::{self, LogPolicy};

/// Console output (stderr) only in verbose mode; the file always gets logs.
/// Keep the returned guard alive so buffered file lines are flushed on exit.
pub fn init(verbose: bool, no_console: bool) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let console = (verbose && !no_console).then(|| fmt::layer().with_writer(std::io::stderr));

    // Reported once the subscriber is installed.
    let mut problems: Vec<String> = Vec::new();

    let mut guard = None;
    let file = logfile::default_log_path().and_then(|path| {
        problems = prepare(&path);

        let dir = path.parent()?;
        let name = path.file_name()?;
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);

        Some(fmt::layer().with_ansi(false).with_writer(writer))
    });

    let has_file = file.is_some();

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    if verbose {
        tracing::debug!("debug logging enabled");
    }
    for problem in &problems {
        tracing::warn!("{}", problem);
    }
    if !has_file {
        tracing::warn!("file logging unavailable (no cache directory)");
    }

    guard
}

/// Rotate the log file and stamp a run header. Returns what went wrong.
fn prepare(path: &Path) -> Vec<String> {
    let mut problems = Vec::new();

    let needs_blank = logfile::prepare_log_file(path, LogPolicy::default()).unwrap_or_else(|e| {
        problems.push(format!("failed to prepare log file {}: {}", path.display(), e));
        false
    });

    if needs_blank && let Err(e) = logfile::write_raw_line(path, "") {
        problems.push(format!("failed to write to {}: {}", path.display(), e));
    }

    if let Err(e) = logfile::write_raw_line(path, &logfile::run_header()) {
        problems.push(format!("failed to write run header to {}: {}", path.display(), e));
    }

    problems
}
