//! Tracer contract and the scoped span guard.

use crate::span::{KeyValue, SpanKind};

/// Write-only sink for spans.
///
/// Nothing returned by a tracer is read back by the instrumented code except
/// the handle itself.
pub trait Tracer: Send + Sync {
    /// Open a span with its initial attributes.
    fn start_span(&self, name: &str, kind: SpanKind, attributes: Vec<KeyValue>)
        -> Box<dyn SpanHandle>;
}

/// An open span.
pub trait SpanHandle: Send {
    fn add_event(&mut self, name: &str, attributes: Vec<KeyValue>);

    fn set_attribute(&mut self, attribute: KeyValue);

    /// Mark the terminal status as an error.
    fn set_error_status(&mut self, message: String);

    /// Close the span. Consumes the handle, so it cannot run twice.
    fn end(self: Box<Self>);
}

/// Owns an open span and ends it when dropped.
///
/// Every exit path of the scope that holds the guard closes the span,
/// including early returns and `?`.
pub struct SpanGuard {
    handle: Option<Box<dyn SpanHandle>>,
}

impl SpanGuard {
    pub fn new(handle: Box<dyn SpanHandle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Start a span on `tracer` and guard it.
    pub fn start(
        tracer: &dyn Tracer,
        name: &str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Self {
        Self::new(tracer.start_span(name, kind, attributes))
    }

    pub fn add_event(&mut self, name: &str, attributes: Vec<KeyValue>) {
        if let Some(handle) = self.handle.as_mut() {
            handle.add_event(name, attributes);
        }
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<crate::AttributeValue>) {
        if let Some(handle) = self.handle.as_mut() {
            handle.set_attribute(KeyValue::new(key, value));
        }
    }

    pub fn set_error_status(&mut self, message: impl Into<String>) {
        if let Some(handle) = self.handle.as_mut() {
            handle.set_error_status(message.into());
        }
    }

    /// End the span now instead of at scope exit.
    pub fn end(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.end();
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.end();
        }
    }
}
