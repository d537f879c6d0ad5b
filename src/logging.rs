//! File logging for the terminal editor.
//!
//! The terminal UI owns stdout, so events only ever go to a log file.
//!
//! ## Environment Variables
//!
//! 1. **`TEXFIELD_LOG`** (highest priority): a bare level such as `debug` applies
//!    to this crate only; anything containing `=`, `:` or `,` is used verbatim
//! 2. **`RUST_LOG`**: standard tracing filter
//! 3. **Default**: `warn` globally, `info` for this crate
//!
//! ## Log File Location
//!
//! Default: `<data_local_dir>/texfield/logs/texfield-<pid>.log`.
//! Override with `--log-file <path>`.

use std::{
    env,
    path::{Path, PathBuf},
};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type Error = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_FILTER: &str = "warn,texfield=info";

/// Returned from [`init`]; dropping it flushes and stops the background writer.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

#[derive(Debug, Default)]
pub struct LogConfig {
    pub log_file_path: Option<PathBuf>,
}

pub fn init(config: LogConfig) -> Result<LogGuard, Error> {
    let (log_dir, filename) = resolve_log_path(config.log_file_path);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_filter(create_filter());

    Registry::default().with(file_layer).try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: log_dir.join(filename),
    })
}

/// Test logging to the captured test output. Safe to call from every test.
pub fn test() {
    let _ = fmt()
        .with_env_filter(create_filter())
        .with_test_writer()
        .try_init();
}

fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("texfield-{}.log", std::process::id());

    if let Some(path) = override_path {
        if path.extension().is_some() {
            let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or(filename);
            return (dir, name);
        }
        return (path, filename);
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("texfield")
        .join("logs");
    (dir, filename)
}

fn create_filter() -> EnvFilter {
    if let Ok(level) = env::var("TEXFIELD_LOG") {
        return expand_crate_filter(&level);
    }
    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }
    EnvFilter::new(DEFAULT_FILTER)
}

fn expand_crate_filter(level: &str) -> EnvFilter {
    if level.contains(['=', ':', ',']) {
        return EnvFilter::new(level);
    }
    EnvFilter::new(format!("warn,texfield={level}"))
}
