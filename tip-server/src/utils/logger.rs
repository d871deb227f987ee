//! Logging Infrastructure
//!
//! Structured logging for development (stdout) and production (daily rolling file).

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Log file prefix inside `LOG_DIR`
pub const LOG_FILE_PREFIX: &str = "tip-server";

/// Initialize the logger at `info` on stdout
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// `log_level` accepts any `EnvFilter` directive (`info`, `tip_server=debug`, ...).
/// File output is only used when `log_dir` exists.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = build_filter(log_level.unwrap_or("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = resolve_log_dir(log_dir) {
        let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        // try_init: tests may install a subscriber more than once
        let _ = subscriber.with_ansi(false).with_writer(file_appender).try_init();
        return;
    }

    let _ = subscriber.try_init();
}

/// Parse a filter directive, falling back to `info`
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Returns the directory only when it exists
pub fn resolve_log_dir(log_dir: Option<&str>) -> Option<&str> {
    log_dir.filter(|dir| Path::new(dir).is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_log_dir_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        assert_eq!(resolve_log_dir(Some(path)), Some(path));
        assert_eq!(resolve_log_dir(Some("/definitely/not/here")), None);
        assert_eq!(resolve_log_dir(None), None);
    }

    #[test]
    fn test_build_filter_falls_back_on_garbage() {
        let filter = build_filter("tip_server=debug");
        assert!(filter.to_string().contains("tip_server=debug"));

        let filter = build_filter("[[not a filter");
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_init_logger_writes_to_rolling_file() {
        let dir = tempfile::tempdir().unwrap();
        init_logger_with_file(Some("info"), dir.path().to_str());
        tracing::info!("logger smoke test");
        // A second init must not panic
        init_logger();
    }
}
