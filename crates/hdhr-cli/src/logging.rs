//! Tracing subscriber setup.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Dated log files kept, the active one included.
const MAX_LOG_FILES: usize = 7;

/// Daily rolling appender for `log_file`.
///
/// `dir/name.log` becomes `dir/name.YYYY-MM-DD.log`.
fn rolling_appender(log_file: &Path) -> Result<RollingFileAppender> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let prefix = log_file
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("invalid log file name: {}", log_file.display()))?;
    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(MAX_LOG_FILES);
    if let Some(ext) = log_file.extension().and_then(|s| s.to_str()) {
        builder = builder.filename_suffix(ext);
    }
    builder
        .build(dir)
        .with_context(|| format!("failed to open log file {}", log_file.display()))
}

/// Installs the global subscriber: stderr plus a daily rotated log file.
///
/// `RUST_LOG` selects the level (default `info`). With the `otel` feature,
/// spans are also exported when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// The returned guard flushes the file writer on drop and must be held
/// until exit.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global
/// subscriber is already installed.
pub fn init(log_file: &Path) -> Result<WorkerGuard> {
    let (file_writer, guard) = tracing_appender::non_blocking(rolling_appender(log_file)?);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(file_writer);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    #[cfg(feature = "otel")]
    {
        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        registry
            .with(otel_layer)
            .try_init()
            .context("failed to install tracing subscriber")?;
    }

    #[cfg(not(feature = "otel"))]
    registry
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
