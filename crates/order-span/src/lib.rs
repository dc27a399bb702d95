//! Span instrumentation for order-service.
//!
//! This crate provides the span vocabulary shared by the service and its
//! tests, the write-only [`Tracer`] contract the workflow talks to, and the
//! tracer backends the binary can select at startup.
//!
//! # Span Lifecycle
//!
//! ```text
//! Tracer::start_span ──> SpanGuard (open) ──annotate──> drop ──> SpanHandle::end (closed)
//! ```
//!
//! # Usage
//!
//! 1. Pick a backend: `RecordingTracer`, `LogTracer` or `OtelTracer`.
//! 2. Start a span and wrap it in a `SpanGuard`.
//! 3. Pass the guard by `&mut` to whatever needs to annotate it; the span is
//!    ended exactly once when the guard goes out of scope.

pub mod error;
pub mod log;
pub mod otel;
pub mod recording;
pub mod span;
pub mod tracer;

pub use error::TraceError;
pub use log::LogTracer;
pub use otel::{
    install_stdout_provider, service_resource, shutdown_provider, OtelTracer, TracerProvider,
};
pub use recording::RecordingTracer;
pub use span::{AttributeValue, KeyValue, RecordedSpan, SpanEvent, SpanKind, SpanStatus};
pub use tracer::{SpanGuard, SpanHandle, Tracer};
