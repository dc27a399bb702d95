//! Tracer that writes each finished span as one structured log event.

use tracing::{info, warn};

use crate::span::{KeyValue, RecordedSpan, SpanKind, SpanStatus};
use crate::tracer::{SpanHandle, Tracer};

/// Emits finished spans through `tracing` under the `order_span` target.
#[derive(Debug, Clone)]
pub struct LogTracer {
    service_name: String,
}

impl LogTracer {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Tracer for LogTracer {
    fn start_span(
        &self,
        name: &str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Box<dyn SpanHandle> {
        Box::new(LogSpan {
            service_name: self.service_name.clone(),
            span: RecordedSpan::new(name, kind, attributes),
        })
    }
}

struct LogSpan {
    service_name: String,
    span: RecordedSpan,
}

impl SpanHandle for LogSpan {
    fn add_event(&mut self, name: &str, attributes: Vec<KeyValue>) {
        self.span.add_event(name, attributes);
    }

    fn set_attribute(&mut self, attribute: KeyValue) {
        self.span.set_attribute(attribute);
    }

    fn set_error_status(&mut self, message: String) {
        self.span.fail(message);
    }

    fn end(self: Box<Self>) {
        let LogSpan {
            service_name,
            mut span,
        } = *self;
        span.finish();

        let attributes = serde_json::to_string(&span.attributes).unwrap_or_default();
        let events = serde_json::to_string(&span.events).unwrap_or_default();

        match span.status {
            SpanStatus::Unset => info!(
                target: "order_span",
                service = %service_name,
                span_id = %span.span_id,
                span_name = %span.name,
                kind = span.kind.as_str(),
                duration_ms = span.duration_ms.unwrap_or(0),
                attributes = %attributes,
                events = %events,
                "span finished"
            ),
            SpanStatus::Error => warn!(
                target: "order_span",
                service = %service_name,
                span_id = %span.span_id,
                span_name = %span.name,
                kind = span.kind.as_str(),
                duration_ms = span.duration_ms.unwrap_or(0),
                attributes = %attributes,
                events = %events,
                error = span.error.as_deref().unwrap_or(""),
                "span finished with error"
            ),
        }
    }
}
