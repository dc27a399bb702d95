//! OpenTelemetry backend.
//!
//! `OtelTracer` forwards every call to the globally installed OpenTelemetry
//! tracer provider. `install_stdout_provider` installs an SDK provider that
//! exports finished spans to stdout; without it the global provider is a
//! no-op and spans are dropped.

use std::borrow::Cow;

use opentelemetry::global::{self, BoxedSpan, BoxedTracer};
use opentelemetry::trace::{Span as _, SpanKind as OtelSpanKind, Status, Tracer as _};
pub use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{trace::Config, Resource};

use crate::error::{Result, TraceError};
use crate::span::{AttributeValue, KeyValue, SpanKind};
use crate::tracer::{SpanHandle, Tracer};

/// Tracer backed by the OpenTelemetry global provider.
pub struct OtelTracer {
    tracer: BoxedTracer,
}

impl OtelTracer {
    /// Obtain a named tracer from the global provider.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            tracer: global::tracer(Cow::Owned(name)),
        }
    }
}

impl Tracer for OtelTracer {
    fn start_span(
        &self,
        name: &str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Box<dyn SpanHandle> {
        let span = self
            .tracer
            .span_builder(name.to_string())
            .with_kind(to_otel_kind(kind))
            .with_attributes(attributes.into_iter().map(to_otel_key_value))
            .start(&self.tracer);
        Box::new(OtelSpan { span })
    }
}

struct OtelSpan {
    span: BoxedSpan,
}

impl SpanHandle for OtelSpan {
    fn add_event(&mut self, name: &str, attributes: Vec<KeyValue>) {
        self.span.add_event(
            name.to_string(),
            attributes.into_iter().map(to_otel_key_value).collect(),
        );
    }

    fn set_attribute(&mut self, attribute: KeyValue) {
        self.span.set_attribute(to_otel_key_value(attribute));
    }

    fn set_error_status(&mut self, message: String) {
        self.span.set_status(Status::error(message));
    }

    fn end(mut self: Box<Self>) {
        self.span.end();
    }
}

/// Resource attribute naming the emitting service.
pub const SERVICE_NAME_KEY: &str = "service.name";

/// SDK default resource with `service.name` set to `service_name`.
pub fn service_resource(service_name: &str) -> Resource {
    Resource::default().merge(&Resource::new([opentelemetry::KeyValue::new(
        SERVICE_NAME_KEY,
        service_name.to_string(),
    )]))
}

/// Install a global SDK provider exporting spans to stdout.
///
/// Exported spans carry `service_name` as their `service.name` resource.
/// Returns the provider so the caller can flush it on exit.
pub fn install_stdout_provider(service_name: &str) -> TracerProvider {
    let provider = TracerProvider::builder()
        .with_config(Config::default().with_resource(service_resource(service_name)))
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .build();
    global::set_tracer_provider(provider.clone());
    tracing::debug!(service = service_name, "installed stdout OpenTelemetry tracer provider");
    provider
}

/// Flush pending spans and shut the provider down.
pub fn shutdown_provider(provider: &TracerProvider) -> Result<()> {
    let result = provider
        .shutdown()
        .map_err(|e| TraceError::ShutdownFailed(e.to_string()));
    global::shutdown_tracer_provider();
    result
}

fn to_otel_kind(kind: SpanKind) -> OtelSpanKind {
    match kind {
        SpanKind::Internal => OtelSpanKind::Internal,
        SpanKind::Server => OtelSpanKind::Server,
        SpanKind::Client => OtelSpanKind::Client,
        SpanKind::Producer => OtelSpanKind::Producer,
        SpanKind::Consumer => OtelSpanKind::Consumer,
    }
}

fn to_otel_key_value(attribute: KeyValue) -> opentelemetry::KeyValue {
    let KeyValue { key, value } = attribute;
    match value {
        AttributeValue::String(v) => opentelemetry::KeyValue::new(key, v),
        AttributeValue::Int(v) => opentelemetry::KeyValue::new(key, v),
        AttributeValue::Float(v) => opentelemetry::KeyValue::new(key, v),
        AttributeValue::Bool(v) => opentelemetry::KeyValue::new(key, v),
    }
}
