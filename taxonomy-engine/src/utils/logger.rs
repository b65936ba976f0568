//! 日志初始化 - taxonomy-server
//!
//! `RUST_LOG` wins when set (e.g. `RUST_LOG=taxonomy_engine=debug`), otherwise
//! `LOG_LEVEL` from [`crate::Config`] applies to everything. With `LOG_DIR`
//! set, output goes to `<LOG_DIR>/taxonomy-server.<date>` instead of stdout.

use std::path::Path;

use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "taxonomy-server";

/// Stdout logging at `info`, for tests and tools
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize logging for the server binary
///
/// Falls back to stdout when `log_dir` cannot be created. Later calls are
/// ignored, so tests may call this freely.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = build_filter(log_level.unwrap_or("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    if let Some(dir) = log_dir.map(Path::new)
        && std::fs::create_dir_all(dir).is_ok()
    {
        let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        let _ = subscriber.with_ansi(false).with_writer(file_appender).try_init();
        return;
    }

    let _ = subscriber.try_init();
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
