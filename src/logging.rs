//! Subscriber installation for the `vkbot` binary.
//!
//! `serve` with a logs directory gets [`init_production`]: JSON lines in a
//! daily file plus text on stderr. Everything else gets [`init_cli`].

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background file writer alive.
///
/// Hold it for the life of the process; buffered lines are written out
/// when it goes away.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the file + stderr subscriber used by a long-running server.
///
/// Log files are named `vkbot.log.<date>` inside `logs_dir`, which is created
/// when missing. The filter comes from `RUST_LOG` when set, else
/// `default_level`.
///
/// # Errors
///
/// Fails when `logs_dir` cannot be created, or when another global
/// subscriber got there first.
pub fn init_production(logs_dir: &Path, default_level: &str) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create logs directory {}: {e}",
            logs_dir.display()
        )
    })?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "vkbot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking);

    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(json_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LoggingGuard { _guard: guard })
}

/// Install a plain stderr subscriber for one-shot commands.
pub fn init_cli(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .init();
}
