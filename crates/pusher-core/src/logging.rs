//! Logging configuration using tracing

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "PUSHER_LOG";

const LOG_FILE_PREFIX: &str = "pusher.log";

const DEFAULT_FILTER: &str = "pusher=info,pusher_app=info,pusher_simctl=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/pusher/logs/` so stdout stays free for
/// the NDJSON stream. Log level is controlled by the `PUSHER_LOG` environment
/// variable.
///
/// # Examples
/// ```bash
/// PUSHER_LOG=debug cargo run
/// PUSHER_LOG=pusher_app=trace cargo run
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("Pusher starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("pusher").join("logs")
}

/// Get the log file path for the current day.
///
/// The daily appender rotates on UTC dates and suffixes the prefix with them.
pub fn get_current_log_file() -> PathBuf {
    get_log_directory().join(log_file_name(Utc::now().date_naive()))
}

fn log_file_name(date: NaiveDate) -> String {
    format!("{}.{}", LOG_FILE_PREFIX, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_lives_in_pusher_dir() {
        let path = get_current_log_file();
        assert!(path.parent().unwrap().ends_with("pusher/logs"));
        let today = log_file_name(Utc::now().date_naive());
        assert_eq!(path.file_name().unwrap().to_str(), Some(today.as_str()));
    }

    #[test]
    fn test_log_file_name_has_date_suffix() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(log_file_name(date), "pusher.log.2024-01-08");
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
