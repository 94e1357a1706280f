use serde::Deserialize;

use super::exporters::ExporterConfig;

/// Trace sampling and export overrides
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracingConfig {
    /// Sampling rate between 0.0 and 1.0
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    /// Honor the sampling decision of an incoming parent span
    #[serde(default = "default_true")]
    pub parent_based: bool,
    /// Replaces the shared exporter for traces
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_sampling_rate() -> f64 {
    1.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}
