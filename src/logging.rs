//! Logging setup
//!
//! JSON console output, plus optional daily-rolling JSON log files written
//! through a non-blocking appender.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name prefix for rolled log files (`lunar-lens.log.2025-01-31`)
pub const LOG_FILE_PREFIX: &str = "lunar-lens.log";

/// Filter from RUST_LOG, falling back to `log_level`.
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Daily-rolling writer in `dir`, created if missing.
///
/// The guard must be kept alive for buffered lines to reach the file.
pub fn file_writer(dir: &Path) -> io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber.
///
/// Returns the file writer guard when `log_dir` is set; hold it until
/// shutdown.
pub fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer().json().with_filter(env_filter(log_level));
    let subscriber = tracing_subscriber::registry().with(console_layer);

    match log_dir {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            let file_layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(false)
                .with_filter(env_filter(log_level));
            subscriber.with(file_layer).try_init()?;
            Ok(Some(guard))
        }
        None => {
            subscriber.try_init()?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");

        let (_writer, _guard) = file_writer(&logs).unwrap();
        assert!(logs.is_dir());
    }

    #[test]
    fn test_file_writer_writes_prefixed_file() {
        let dir = tempdir().unwrap();

        let (mut writer, guard) = file_writer(dir.path()).unwrap();
        writer.write_all(b"{\"message\":\"hello\"}\n").unwrap();
        drop(guard);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(entries.len(), 1);

        let name = entries[0].file_name().to_string_lossy().to_string();
        assert!(name.starts_with(LOG_FILE_PREFIX), "{name}");

        let content = std::fs::read_to_string(entries[0].path()).unwrap();
        assert!(content.contains("hello"));
    }
}
