use std::{collections::HashMap, time::Duration};

use serde::Deserialize;
use url::Url;

/// Telemetry configuration
///
/// Logging is always on; OTLP export only starts when an exporter is set
/// at the top level or under `tracing`/`metrics`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name for telemetry metadata
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Additional resource attributes
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
    /// Exporter shared by tracing and metrics
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

impl TelemetryConfig {
    /// Whether any OTLP exporter is configured
    pub fn has_exporter(&self) -> bool {
        self.metrics_exporter().is_some() || self.tracing_exporter().is_some()
    }

    /// Exporter for metrics, falling back to the shared one
    pub fn metrics_exporter(&self) -> Option<&ExporterConfig> {
        self.metrics
            .as_ref()
            .and_then(|m| m.exporter.as_ref())
            .or(self.exporter.as_ref())
    }

    /// Exporter for spans, falling back to the shared one
    pub fn tracing_exporter(&self) -> Option<&ExporterConfig> {
        self.tracing
            .as_ref()
            .and_then(|t| t.exporter.as_ref())
            .or(self.exporter.as_ref())
    }
}

/// OTLP exporter endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub endpoint: Url,
    #[serde(default)]
    pub protocol: ExportProtocol,
    /// How often metrics are pushed (e.g. "30s")
    #[serde(default = "default_export_interval")]
    pub export_interval: String,
}

impl ExporterConfig {
    /// Parse the metric push interval
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is malformed
    pub fn export_interval_duration(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.export_interval)
            .map_err(|e| anyhow::anyhow!("invalid telemetry export_interval '{}': {e}", self.export_interval))
    }
}

/// OTLP wire protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportProtocol {
    #[default]
    Grpc,
    HttpProto,
}

/// Span sampling and export
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracingConfig {
    /// Fraction of root spans kept, between 0.0 and 1.0
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    /// Follow the caller's sampling decision when one is propagated
    #[serde(default = "default_parent_based")]
    pub parent_based: bool,
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
}

impl TracingConfig {
    /// Sampling rate clamped to `0.0..=1.0`
    pub fn sampling_ratio(&self) -> f64 {
        self.sampling_rate.clamp(0.0, 1.0)
    }
}

/// Metric export
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
}

fn default_service_name() -> String {
    "remix".to_string()
}

fn default_export_interval() -> String {
    "30s".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_sampling_rate() -> f64 {
    1.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_parent_based() -> bool {
    true
}
