//! Subscriber setup
//!
//! Human-readable events go to stderr so that command output on stdout stays
//! machine-readable. With `logging.local_enabled`, the same events are also
//! written as JSON lines to a rotated file under `logging.local_path`.

use crate::config::LoggingConfig;
use crate::domain::{AegisError, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File name prefix of rotated log files
const LOG_FILE_NAME: &str = "aegis.log";

const LEVELS: [(&str, Level); 5] = [
    ("trace", Level::TRACE),
    ("debug", Level::DEBUG),
    ("info", Level::INFO),
    ("warn", Level::WARN),
    ("error", Level::ERROR),
];

/// Keeps the background file writer alive; drop it last so buffered events
/// are flushed
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Installs the global subscriber
///
/// `RUST_LOG` overrides `level` when set.
///
/// # Errors
///
/// Returns `AegisError::Configuration` for an unknown level or rotation, an
/// unusable log directory, or when a global subscriber is already installed
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("aegis={level}")));

    let (file_writer, file_guard) = match file_writer(config)? {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(filter.clone());

    let file = file_writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(writer)
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| AegisError::Configuration(format!("Failed to install logger: {e}")))?;

    tracing::debug!(
        file_logging = config.local_enabled,
        path = %config.local_path,
        rotation = %config.local_rotation,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn file_writer(config: &LoggingConfig) -> Result<Option<(NonBlocking, WorkerGuard)>> {
    if !config.local_enabled {
        return Ok(None);
    }

    let rotation = parse_rotation(&config.local_rotation)?;
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        AegisError::Configuration(format!(
            "Cannot create log directory {}: {}",
            config.local_path, e
        ))
    })?;

    let appender = RollingFileAppender::new(rotation, &config.local_path, LOG_FILE_NAME);
    Ok(Some(tracing_appender::non_blocking(appender)))
}

fn parse_log_level(level: &str) -> Result<Level> {
    let wanted = level.trim().to_ascii_lowercase();
    LEVELS
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, level)| *level)
        .ok_or_else(|| {
            AegisError::Configuration(format!(
                "Invalid log level '{level}'. Must be one of: trace, debug, info, warn, error"
            ))
        })
}

fn parse_rotation(rotation: &str) -> Result<Rotation> {
    match rotation {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        "never" => Ok(Rotation::NEVER),
        other => Err(AegisError::Configuration(format!(
            "Invalid log rotation '{other}'. Must be one of: daily, hourly, never"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_levels() {
        for (name, level) in LEVELS {
            assert_eq!(parse_log_level(name).unwrap(), level);
        }
        assert_eq!(parse_log_level(" Debug ").unwrap(), Level::DEBUG);
        assert!(parse_log_level("verbose").is_err());
        assert!(parse_log_level("3").is_err());
    }

    #[test]
    fn test_rotation() {
        assert_eq!(parse_rotation("never").unwrap(), Rotation::NEVER);
        assert!(matches!(
            parse_rotation("size"),
            Err(AegisError::Configuration(_))
        ));
    }

    #[test]
    fn test_file_writer_disabled() {
        assert!(file_writer(&LoggingConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("logs");
        let config = LoggingConfig {
            local_enabled: true,
            local_path: path.to_string_lossy().into_owned(),
            local_rotation: "hourly".to_string(),
        };

        let writer = file_writer(&config).unwrap();
        assert!(writer.is_some());
        assert!(path.is_dir());
    }
}
