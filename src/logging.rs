//! Log output setup for the binary.
//!
//! Logs go to stderr and, when `logging.file` is set, to a file rotated at
//! midnight without ANSI colours. `RUST_LOG` overrides the level chosen from
//! `logging.detailed`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Today's file plus three previous days.
const MAX_LOG_FILES: usize = 4;

/// Default filter directive for the given settings.
pub fn default_directive(settings: &LoggingSettings) -> &'static str {
    if settings.detailed {
        "info"
    } else {
        "warn"
    }
}

/// Daily-rotated appender for `path`.
///
/// `/var/log/levelwatch.log` becomes `/var/log/levelwatch.2024-06-01.log`
/// and so on; older files beyond the retention limit are removed.
pub fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let prefix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Invalid log file name {}", path.display()))?;

    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(MAX_LOG_FILES);
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        builder = builder.filename_suffix(ext);
    }

    builder
        .build(dir)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Install the global subscriber. Call once, early in `main`.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the life of the process.
pub fn init(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(settings)));

    let (file_layer, guard) = match &settings.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}
