//! Observability: structured logging, metrics and request correlation.

mod logging;
mod metrics;
mod request_context;

pub use logging::{LogFormat, LoggingConfig};
pub use metrics::{MetricsConfig, install_prometheus};
pub use request_context::{RequestContext, current_request_id, scope_request_context};

use crate::config::ObservabilitySettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Full observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

impl ObservabilityConfig {
    /// Builds configuration from config file settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: &ObservabilitySettings, verbose: bool) -> Self {
        Self {
            logging: LoggingConfig::from_settings(settings.logging.as_ref(), verbose),
            metrics: MetricsConfig::from_settings(settings.metrics.as_ref()),
        }
    }
}

/// Handle for observability runtime components.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityHandle {
    prometheus: Option<PrometheusHandle>,
}

impl ObservabilityHandle {
    /// Returns the Prometheus handle when metrics are enabled.
    #[must_use]
    pub const fn prometheus(&self) -> Option<&PrometheusHandle> {
        self.prometheus.as_ref()
    }
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes logging and metrics for the process.
///
/// # Errors
///
/// Returns an error if observability has already been initialized, the log
/// file cannot be opened, or a global subscriber or recorder is already set.
pub fn init(config: ObservabilityConfig) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "observability already initialized".to_string(),
        });
    }

    let prometheus = install_prometheus(&config.metrics)?;
    let filter = config.logging.env_filter();

    match (&config.logging.file, config.logging.format) {
        (Some(log_file), LogFormat::Json) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_current_span(true)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(init_error)?;
        },
        (Some(log_file), LogFormat::Pretty) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_current_span(true)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(io::stderr)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(init_error)?;
        },
    }

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "failed to mark observability initialized".to_string(),
        })?;

    Ok(ObservabilityHandle { prometheus })
}

/// Thread-safe file writer for logging.
#[derive(Clone)]
struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Opens a log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<LogFileWriter> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::operation("create_log_dir", e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::OperationFailed {
            operation: "open_log_file".to_string(),
            cause: format!("{}: {}", path.display(), e),
        })?;

    Ok(LogFileWriter {
        file: Arc::new(Mutex::new(file)),
    })
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::operation("observability_init", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingSettings, MetricsSettings};

    #[test]
    fn test_config_from_settings() {
        let settings = ObservabilitySettings {
            logging: Some(LoggingSettings {
                format: Some("json".to_string()),
                filter: None,
                file: None,
            }),
            metrics: Some(MetricsSettings {
                enabled: Some(false),
            }),
        };
        let config = ObservabilityConfig::from_settings(&settings, true);
        assert!(config.logging.filter.contains("atlas=debug"));
    }

    #[test]
    fn test_log_file_writer_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("atlas.log");

        let mut writer = open_log_file(&path).expect("open");
        writer.write_all(b"first\n").expect("write");
        writer.flush().expect("flush");
        let mut second = open_log_file(&path).expect("reopen");
        second.write_all(b"second\n").expect("write");

        let contents = std::fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "first\nsecond\n");
    }
}
