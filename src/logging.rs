use configuration::{LogLevel, Logging};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console and daily rolling file output.
///
/// An explicit `--log-level` wins, then `RUST_LOG`, then the configured level.
/// The returned guard must live until the end of `main` or buffered lines are lost.
pub fn init_tracing(logging: &Logging, level_override: Option<LogLevel>) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.directory)?;

    let file_appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = match level_override {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(logging.level.as_directive())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(guard)
}
