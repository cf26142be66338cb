use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::Config;

/// Daily rolling log file under `config.log_dir`. Keep the returned guard
/// alive for the life of the process or buffered lines are lost.
pub fn init_logging(config: &Config) -> WorkerGuard {
    let file_appender = rolling::daily(&config.log_dir, "payroll.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    guard
}
