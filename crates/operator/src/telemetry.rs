//! Internal logging and tracing configurations

use std::env;

use opentelemetry::trace::TraceContextExt as _;
use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, TraceId};
use opentelemetry_otlp::SpanExporter;
use opentelemetry_resource_detectors::{K8sResourceDetector, ProcessResourceDetector};
use opentelemetry_sdk::{
    Resource,
    trace::{SdkTracer, SdkTracerProvider},
};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt as _;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Fetch an opentelemetry::trace::TraceId as hex through the full tracing stack
pub fn get_trace_id() -> TraceId {
    tracing::Span::current()
        .context()
        .span()
        .span_context()
        .trace_id()
}

fn resource() -> Resource {
    Resource::builder()
        .with_detector(Box::new(K8sResourceDetector))
        .with_detector(Box::new(ProcessResourceDetector))
        .with_service_name(env!("CARGO_PKG_NAME"))
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build()
}

fn init_tracer() -> anyhow::Result<SdkTracer> {
    let exporter = SpanExporter::builder().with_tonic().build()?;

    let provider = SdkTracerProvider::builder()
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build();

    Ok(provider.tracer("platform-operator"))
}

fn is_otel_enabled() -> bool {
    env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
}

/// Initializes tracing with subscribers.
///
/// Log format is plain text unless `LOG_FORMAT=json`; the filter comes from
/// `LOG_LEVEL`. An OTLP span exporter is attached only when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// # Errors
/// Will return `Err` if it wasn't able to initialize tracing
pub fn init() -> anyhow::Result<()> {
    let logger = if env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let reg = Registry::default()
        .with(EnvFilter::from_env("LOG_LEVEL"))
        .with(logger);

    if is_otel_enabled() {
        let otel = OpenTelemetryLayer::new(init_tracer()?);
        reg.with(otel).try_init()?;
    } else {
        reg.try_init()?;
    }

    Ok(())
}
