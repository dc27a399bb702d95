//! In-memory tracer.
//!
//! Keeps finished spans in a bounded buffer and counts span starts and ends,
//! so callers can check that every span opened was closed exactly once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::span::{KeyValue, RecordedSpan, SpanKind};
use crate::tracer::{SpanHandle, Tracer};

/// Default number of finished spans retained.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug)]
struct Recorder {
    capacity: usize,
    started: AtomicU64,
    ended: AtomicU64,
    finished: Mutex<VecDeque<RecordedSpan>>,
}

impl Recorder {
    fn push(&self, span: RecordedSpan) {
        self.ended.fetch_add(1, Ordering::SeqCst);
        let mut finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        if finished.len() == self.capacity {
            finished.pop_front();
        }
        finished.push_back(span);
    }
}

/// Tracer that records spans in memory.
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone)]
pub struct RecordingTracer {
    recorder: Arc<Recorder>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a tracer that retains at most `capacity` finished spans.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recorder: Arc::new(Recorder {
                capacity: capacity.max(1),
                started: AtomicU64::new(0),
                ended: AtomicU64::new(0),
                finished: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Finished spans, oldest first.
    pub fn finished_spans(&self) -> Vec<RecordedSpan> {
        self.recorder
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn last_span(&self) -> Option<RecordedSpan> {
        self.recorder
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    pub fn started_count(&self) -> u64 {
        self.recorder.started.load(Ordering::SeqCst)
    }

    pub fn ended_count(&self) -> u64 {
        self.recorder.ended.load(Ordering::SeqCst)
    }

    /// Drop retained spans. Counters are kept.
    pub fn clear(&self) {
        self.recorder
            .finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for RecordingTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for RecordingTracer {
    fn start_span(
        &self,
        name: &str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Box<dyn SpanHandle> {
        self.recorder.started.fetch_add(1, Ordering::SeqCst);
        Box::new(RecordingSpan {
            span: RecordedSpan::new(name, kind, attributes),
            recorder: Arc::clone(&self.recorder),
        })
    }
}

struct RecordingSpan {
    span: RecordedSpan,
    recorder: Arc<Recorder>,
}

impl SpanHandle for RecordingSpan {
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
        let RecordingSpan { mut span, recorder } = *self;
        span.finish();
        recorder.push(span);
    }
}
