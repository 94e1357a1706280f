use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;
use parley_config::TelemetryConfig;

/// Resource describing this process on exported spans
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    let attrs = [
        KeyValue::new(semconv::SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
    ]
    .into_iter()
    .chain(
        config
            .resource_attributes
            .iter()
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
    );

    Resource::builder().with_attributes(attrs).build()
}
