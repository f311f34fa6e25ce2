use crate::models::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Installs the global subscriber: human-readable lines on stdout and,
/// when enabled, JSON lines in a daily-rolling file under `config.directory`.
///
/// The returned guard flushes the file writer; keep it alive for the life of
/// the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},tower_http=warn,hyper=warn", config.level))
    });

    let stdout = fmt::layer().with_writer(std::io::stdout).with_ansi(true);

    let (file, guard) = if config.json_file {
        std::fs::create_dir_all(&config.directory)
            .with_context(|| format!("creating log directory {}", config.directory))?;
        let appender = tracing_appender::rolling::daily(&config.directory, "console.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .json()
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .context("installing tracing subscriber")?;

    info!("Logging initialized");
    Ok(guard)
}
