//! Message relay
//!
//! Receives tagged wire messages from whichever boundary is live, filters
//! out anything that is not a console message or that belongs to a
//! superseded generation, and hands structured signals to the sink.

pub mod event;
pub mod gate;
pub mod sink;

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::boundary::Generation;
use crate::synth::shim::MESSAGE_TYPE;

pub use event::{ConsoleSignal, EventKind, RuntimeEvent};
pub use gate::GenerationGate;
pub use sink::ConsoleSink;

use event::WireMessage;

/// Message shown when a boundary could not be loaded at all
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load preview";

/// What a boundary forwarder hands to the relay
#[derive(Debug, Clone)]
pub enum EnvelopeBody {
    /// Raw message posted from inside the boundary
    Message(serde_json::Value),
    /// The boundary never came up; the reason is logged, not shown
    LoadFailed(String),
}

/// A message tagged with the generation of the boundary it came from
#[derive(Debug, Clone)]
pub struct Envelope {
    pub generation: Generation,
    pub body: EnvelopeBody,
}

impl Envelope {
    pub fn message(generation: Generation, value: serde_json::Value) -> Self {
        Self {
            generation,
            body: EnvelopeBody::Message(value),
        }
    }

    pub fn load_failed(generation: Generation, reason: impl Into<String>) -> Self {
        Self {
            generation,
            body: EnvelopeBody::LoadFailed(reason.into()),
        }
    }
}

/// Host-side relay from boundaries to a [`ConsoleSink`]
pub struct MessageRelay<S> {
    gate: GenerationGate,
    sink: S,
    delivered: Generation,
    sequence: u64,
}

impl<S: ConsoleSink> MessageRelay<S> {
    pub fn new(gate: GenerationGate, sink: S) -> Self {
        Self {
            gate,
            sink,
            delivered: Generation::NONE,
            sequence: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Relay one envelope. Returns true if something reached the sink.
    pub fn accept(&mut self, envelope: Envelope) -> bool {
        let generation = envelope.generation;
        if self.gate.is_stale(generation) || generation < self.delivered {
            tracing::trace!(
                %generation,
                current = %self.gate.current(),
                "Dropping message from superseded boundary"
            );
            return false;
        }

        let Some(signal) = self.to_signal(envelope) else {
            return false;
        };

        if generation > self.delivered {
            self.delivered = generation;
            self.sequence = 0;
        }
        let signal = match signal {
            Pending::Cleared => ConsoleSignal::Cleared { generation },
            Pending::Event {
                kind,
                payload,
                emitted_at,
            } => {
                let event = RuntimeEvent {
                    id: Uuid::now_v7(),
                    generation,
                    sequence: self.sequence,
                    kind,
                    payload,
                    emitted_at: emitted_at.unwrap_or_else(Utc::now),
                };
                self.sequence += 1;
                ConsoleSignal::Event(event)
            }
        };

        self.sink.deliver(signal);
        true
    }

    fn to_signal(&self, envelope: Envelope) -> Option<Pending> {
        let generation = envelope.generation;
        match envelope.body {
            EnvelopeBody::LoadFailed(reason) => {
                tracing::warn!(%generation, "Preview load failed: {reason}");
                Some(Pending::Event {
                    kind: EventKind::Error,
                    payload: vec![LOAD_FAILED_MESSAGE.to_string()],
                    emitted_at: None,
                })
            }
            EnvelopeBody::Message(value) => {
                let wire = match serde_json::from_value::<WireMessage>(value) {
                    Ok(wire) if wire.kind == MESSAGE_TYPE => wire,
                    Ok(wire) => {
                        tracing::trace!(kind = %wire.kind, "Ignoring message with unknown type");
                        return None;
                    }
                    Err(e) => {
                        tracing::trace!("Ignoring malformed boundary message: {e}");
                        return None;
                    }
                };

                if let Some(stamped) = wire.generation {
                    if stamped != generation.value() {
                        tracing::trace!(%generation, stamped, "Ignoring message stamped for another boundary");
                        return None;
                    }
                }

                if wire.method == "clear" {
                    return Some(Pending::Cleared);
                }
                let Some(kind) = EventKind::parse(&wire.method) else {
                    tracing::trace!(method = %wire.method, "Ignoring unknown console method");
                    return None;
                };
                Some(Pending::Event {
                    kind,
                    payload: wire.payload(),
                    emitted_at: wire.emitted_at(),
                })
            }
        }
    }

    /// Relay envelopes until every sender is gone, then hand the sink back
    pub async fn run(mut self, mut rx: mpsc::Receiver<Envelope>) -> S {
        while let Some(envelope) = rx.recv().await {
            self.accept(envelope);
        }
        tracing::debug!("Message relay stopped");
        self.sink
    }
}

enum Pending {
    Cleared,
    Event {
        kind: EventKind,
        payload: Vec<String>,
        emitted_at: Option<chrono::DateTime<Utc>>,
    },
}
