//! Logging and trace export for Parley
//!
//! Console logging goes through a `tracing-subscriber` fmt layer filtered by
//! `RUST_LOG`. Spans are additionally exported over OTLP when the config
//! names an exporter.

mod metadata;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use parley_config::TelemetryConfig;
use parley_config::telemetry::exporters::{ExportProtocol, ExporterConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Flushes and shuts down the tracer provider when dropped
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown tracer provider: {e}");
        }
    }
}

/// Install the global subscriber
///
/// `log_filter` is an `EnvFilter` directive; an invalid directive falls
/// back to `info`. The returned guard must be held for the lifetime of
/// the process.
///
/// # Errors
///
/// Returns an error if the OTLP span exporter cannot be built
pub fn init(config: Option<&TelemetryConfig>, log_filter: &str) -> anyhow::Result<TelemetryGuard> {
    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let Some((telemetry_config, exporter_config)) =
        config.and_then(|c| c.trace_exporter().map(|exporter| (c, exporter)))
    else {
        tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        return Ok(TelemetryGuard { tracer_provider: None });
    };

    let tracer_provider = init_tracer(telemetry_config, exporter_config)?;
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer("parley"));
    global::set_tracer_provider(tracer_provider.clone());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    Ok(TelemetryGuard {
        tracer_provider: Some(tracer_provider),
    })
}

fn init_tracer(config: &TelemetryConfig, exporter_config: &ExporterConfig) -> anyhow::Result<SdkTracerProvider> {
    let exporter = build_span_exporter(exporter_config)?;

    let sampling_rate = config.tracing.as_ref().map_or(1.0, |t| t.sampling_rate);
    let use_parent_based = config.tracing.as_ref().is_none_or(|t| t.parent_based);

    let provider = SdkTracerProvider::builder()
        .with_resource(metadata::build_resource(config))
        .with_sampler(sampler(sampling_rate, use_parent_based))
        .with_batch_exporter(exporter)
        .build();

    Ok(provider)
}

fn sampler(rate: f64, parent_based: bool) -> Sampler {
    let root = if rate >= 1.0 {
        Sampler::AlwaysOn
    } else if rate <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(rate)
    };

    if parent_based {
        Sampler::ParentBased(Box::new(root))
    } else {
        root
    }
}

fn build_span_exporter(config: &ExporterConfig) -> anyhow::Result<opentelemetry_otlp::SpanExporter> {
    use opentelemetry_otlp::SpanExporter;

    let exporter = match config.protocol {
        ExportProtocol::Grpc => SpanExporter::builder()
            .with_tonic()
            .with_endpoint(config.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build gRPC span exporter: {e}"))?,
        ExportProtocol::HttpProto => SpanExporter::builder()
            .with_http()
            .with_endpoint(config.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP span exporter: {e}"))?,
    };

    Ok(exporter)
}
