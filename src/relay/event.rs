use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::boundary::Generation;

/// Kind of an intercepted console call or failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Log,
    Info,
    Warn,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Log => "log",
            EventKind::Info => "info",
            EventKind::Warn => "warn",
            EventKind::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "log" => Some(EventKind::Log),
            "info" => Some(EventKind::Info),
            "warn" => Some(EventKind::Warn),
            "error" => Some(EventKind::Error),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One intercepted console call or failure, as delivered to the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEvent {
    /// Time-ordered unique id
    pub id: Uuid,
    /// Boundary generation that produced the event
    pub generation: Generation,
    /// Position within the generation, starting at 0
    pub sequence: u64,
    pub kind: EventKind,
    /// Stringified arguments, in call order
    pub payload: Vec<String>,
    pub emitted_at: DateTime<Utc>,
}

impl RuntimeEvent {
    /// Human-readable message: payload joined with single spaces
    pub fn message(&self) -> String {
        self.payload.join(" ")
    }
}

/// What the sink receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleSignal {
    /// A fresh boundary loaded; prior output is stale
    Cleared { generation: Generation },
    Event(RuntimeEvent),
}

impl ConsoleSignal {
    pub fn generation(&self) -> Generation {
        match self {
            ConsoleSignal::Cleared { generation } => *generation,
            ConsoleSignal::Event(event) => event.generation,
        }
    }

    pub fn as_event(&self) -> Option<&RuntimeEvent> {
        match self {
            ConsoleSignal::Event(event) => Some(event),
            ConsoleSignal::Cleared { .. } => None,
        }
    }
}

/// Wire shape posted by the shim
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub method: String,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Generation stamped by the runtime, when it knows it
    #[serde(default)]
    pub generation: Option<u64>,
}

impl WireMessage {
    /// Flatten `args` into display strings.
    ///
    /// The shim always sends an array of strings; anything else is
    /// stringified rather than rejected.
    pub fn payload(&self) -> Vec<String> {
        fn text(value: &serde_json::Value) -> String {
            match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }
        }

        match &self.args {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items.iter().map(text).collect(),
            Some(other) => vec![text(other)],
        }
    }

    pub fn emitted_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}
