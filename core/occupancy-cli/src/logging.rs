//! Tracing setup.
//!
//! `show` logs to stderr. `watch` owns the terminal, so it logs to a daily
//! rolling file under `~/.occupancy/logs` and falls back to stderr when that
//! directory cannot be created.

use std::env;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "OCCUPANCY_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "occupancy.log";

pub enum Target {
    Stderr,
    File,
}

/// Installs the global subscriber. Keep the guard alive until exit.
pub fn init(target: Target) -> Option<WorkerGuard> {
    match target {
        Target::Stderr => {
            init_stderr();
            None
        }
        Target::File => match log_dir() {
            Some(dir) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_ansi(false)
                    .with_writer(writer)
                    .init();
                Some(guard)
            }
            None => {
                init_stderr();
                None
            }
        },
    }
}

fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .init();
}

fn filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn log_dir() -> Option<std::path::PathBuf> {
    let dir = occupancy_core::config::data_dir().ok()?.join("logs");
    fs_err::create_dir_all(&dir).ok()?;
    Some(dir)
}
