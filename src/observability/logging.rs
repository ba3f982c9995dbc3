//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default filter when neither settings nor `RUST_LOG` provide one.
const DEFAULT_FILTER: &str = "atlas=info,tower_http=info";

/// Filter used with `--verbose`.
const VERBOSE_FILTER: &str = "atlas=debug,tower_http=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
    /// Optional log file; stderr when unset.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// `ATLAS_LOG_FORMAT`, `RUST_LOG` and `ATLAS_LOG_FILE` take precedence over
    /// the file. `verbose` wins over everything for the filter.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::from_sources(settings, verbose, |key| std::env::var(key).ok())
    }

    /// Builds logging configuration using `lookup` for environment values.
    #[must_use]
    pub fn from_sources<F>(settings: Option<&LoggingSettings>, verbose: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let format = env("ATLAS_LOG_FORMAT")
            .or_else(|| settings.and_then(|s| s.format.clone()))
            .map_or_else(LogFormat::default, |value| LogFormat::parse(&value));

        let filter = if verbose {
            VERBOSE_FILTER.to_string()
        } else {
            env("RUST_LOG")
                .or_else(|| settings.and_then(|s| s.filter.clone()))
                .unwrap_or_else(|| DEFAULT_FILTER.to_string())
        };

        let file = env("ATLAS_LOG_FILE")
            .or_else(|| settings.and_then(|s| s.file.clone()))
            .map(PathBuf::from);

        Self {
            format,
            filter,
            file,
        }
    }

    /// Builds the event filter, falling back to the default directive when
    /// the configured one does not parse.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}
