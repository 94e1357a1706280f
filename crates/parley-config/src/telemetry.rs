pub mod exporters;
pub mod tracing;

use std::collections::HashMap;

use serde::Deserialize;

use self::{exporters::ExporterConfig, tracing::TracingConfig};

/// Telemetry configuration
///
/// Console logging is always on; OTLP trace export starts only when an
/// exporter is configured here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name reported on exported spans
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Additional resource attributes
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
    /// Default exporter
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
    /// Tracing-specific configuration
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
}

impl TelemetryConfig {
    /// Exporter used for traces, preferring the tracing override
    pub fn trace_exporter(&self) -> Option<&ExporterConfig> {
        self.tracing
            .as_ref()
            .and_then(|t| t.exporter.as_ref())
            .or(self.exporter.as_ref())
    }
}

fn default_service_name() -> String {
    "parley".to_owned()
}
