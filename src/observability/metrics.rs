//! Prometheus metrics.
//!
//! When enabled, a Prometheus recorder is installed for the process and the
//! HTTP server renders it at `/metrics`. Instrumented code uses the `metrics`
//! macros directly; they are no-ops while no recorder is installed.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metrics configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&MetricsSettings>) -> Self {
        Self::from_sources(settings, |key| std::env::var(key).ok())
    }

    /// Builds metrics configuration using `lookup` for environment values.
    #[must_use]
    pub fn from_sources<F>(settings: Option<&MetricsSettings>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("ATLAS_METRICS_ENABLED")
            .as_deref()
            .and_then(parse_bool)
            .or_else(|| settings.and_then(|s| s.enabled))
            .unwrap_or(false);

        Self { enabled }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Installs the Prometheus recorder.
///
/// Returns `Ok(None)` when metrics are disabled.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    PrometheusBuilder::new()
        .install_recorder()
        .map(Some)
        .map_err(|e| Error::operation("metrics_recorder_install", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None, None, false ; "default off")]
    #[test_case(Some(true), None, true ; "enabled in file")]
    #[test_case(Some(true), Some("false"), false ; "env disables")]
    #[test_case(None, Some("1"), true ; "env enables")]
    #[test_case(Some(true), Some("maybe"), true ; "unparseable env ignored")]
    fn test_metrics_enabled(file: Option<bool>, env: Option<&str>, expected: bool) {
        let settings = MetricsSettings { enabled: file };
        let config = MetricsConfig::from_sources(Some(&settings), |key| {
            (key == "ATLAS_METRICS_ENABLED")
                .then(|| env.map(ToString::to_string))
                .flatten()
        });
        assert_eq!(config.enabled, expected);
    }

    #[test]
    fn test_disabled_installs_nothing() {
        let handle = install_prometheus(&MetricsConfig::default()).expect("install");
        assert!(handle.is_none());
    }
}
