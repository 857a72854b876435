//! Log sinks: stdout plus a plain-text file under `LOG_DIR`.

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{ApiConfig, DEFAULT_LOG_FILTER};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open log file: {0}")]
    OpenFile(#[from] InitError),

    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Opens `dir/file_name` for appending behind a background writer thread.
/// The directory is created if missing.
pub fn file_writer(dir: &Path, file_name: &str) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Installs the global subscriber. `RUST_LOG` overrides
/// [`DEFAULT_LOG_FILTER`] for both sinks.
///
/// Buffered file lines are flushed when the returned guard is dropped.
pub fn init(config: &ApiConfig) -> Result<WorkerGuard, LoggingError> {
    let (file, guard) = file_writer(Path::new(&config.log_dir), &config.log_file)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(file),
        )
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_writer_creates_directory_and_appends() {
        let dir = std::env::temp_dir()
            .join(format!("crm-logs-{}", uuid::Uuid::new_v4()))
            .join("nested");

        let (writer, guard) = file_writer(&dir, "CRM_Logs.txt").unwrap();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(writer)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(order_id = 7, "Order status updated");
        });
        drop(guard);

        let contents = std::fs::read_to_string(dir.join("CRM_Logs.txt")).unwrap();
        assert!(contents.contains("Order status updated"));
        assert!(contents.contains("order_id=7"));

        std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_file_writer_reports_unusable_directory() {
        let blocker = std::env::temp_dir().join(format!("crm-logs-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = file_writer(&blocker.join("logs"), "CRM_Logs.txt").unwrap_err();
        assert!(matches!(err, LoggingError::CreateDir { .. }));

        std::fs::remove_file(&blocker).unwrap();
    }
}
