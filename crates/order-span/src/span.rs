//! Core span types.
//!
//! Defines `RecordedSpan`, its attributes and events, and the `SpanKind` and
//! `SpanStatus` enums shared by every tracer backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Role of a span relative to the operation it measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Internal => "internal",
            SpanKind::Server => "server",
            SpanKind::Client => "client",
            SpanKind::Producer => "producer",
            SpanKind::Consumer => "consumer",
        }
    }
}

/// Terminal status of a span.
///
/// A span stays `Unset` unless something marks it as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Unset,
    Error,
}

/// Value of a span or event attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Int(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// A single key/value attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AttributeValue,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A named, timestamped occurrence inside a span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl SpanEvent {
    pub fn new(name: impl Into<String>, attributes: Vec<KeyValue>) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now(),
            attributes: collect_attributes(attributes),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// A span as kept by the in-memory and log backends.
///
/// Attributes are kept sorted so the JSON form is stable between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSpan {
    pub span_id: Uuid,
    pub name: String,
    pub kind: SpanKind,
    pub status: SpanStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub events: Vec<SpanEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordedSpan {
    /// Open a new span.
    pub fn new(name: &str, kind: SpanKind, attributes: Vec<KeyValue>) -> Self {
        Self {
            span_id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            status: SpanStatus::Unset,
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            attributes: collect_attributes(attributes),
            events: Vec::new(),
            error: None,
        }
    }

    /// Record an event.
    pub fn add_event(&mut self, name: &str, attributes: Vec<KeyValue>) {
        self.events.push(SpanEvent::new(name, attributes));
    }

    /// Set or overwrite an attribute.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        self.attributes.insert(attribute.key, attribute.value);
    }

    /// Mark the span as failed with an error message.
    pub fn fail(&mut self, error: String) {
        self.status = SpanStatus::Error;
        self.error = Some(error);
    }

    /// Close the span. Only the first call has an effect.
    pub fn finish(&mut self) {
        if self.ended_at.is_some() {
            return;
        }
        let now = Utc::now();
        self.ended_at = Some(now);
        self.duration_ms = Some((now - self.started_at).num_milliseconds().max(0) as u64);
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// First event with the given name.
    pub fn event(&self, name: &str) -> Option<&SpanEvent> {
        self.events.iter().find(|e| e.name == name)
    }
}

fn collect_attributes(attributes: Vec<KeyValue>) -> BTreeMap<String, AttributeValue> {
    attributes.into_iter().map(|kv| (kv.key, kv.value)).collect()
}
