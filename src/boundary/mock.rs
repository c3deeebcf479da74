//! Mock boundary backend for deterministic testing
//!
//! Implements [`BoundaryBackend`] by emitting pre-configured wire messages
//! instead of executing the document. Loaded documents, generations and
//! teardowns are captured for later assertions.
//!
//! # Example
//! ```no_run
//! use livepreview::boundary::mock::{MockBoundary, MockMessageBuilder};
//!
//! let messages = MockMessageBuilder::new().clear().log(&["x"]).build();
//! let boundary = MockBoundary::new().with_messages(messages);
//! // Hand `boundary` to a PreviewEngine or PreviewSurface...
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use crate::boundary::error::BoundaryError;
use crate::boundary::runner::{BoundaryBackend, BoundaryHandle, Generation};
use crate::synth::SynthesizedDocument;

/// Produces the messages a load emits, given the document and its generation
pub type Responder = Arc<dyn Fn(&str, Generation) -> Vec<Value> + Send + Sync>;

/// Configuration for mock boundary behavior
#[derive(Clone, Default)]
pub struct MockConfig {
    /// Messages to emit on every load (ignored when a responder is set)
    pub messages: Vec<Value>,
    /// Per-load message producer
    pub responder: Option<Responder>,
    /// Delay between messages (simulates a slow page)
    pub message_delay: Duration,
    /// Keep the stream open after the last message until torn down
    pub hold_open: bool,
    /// Whether load() should fail
    pub fail_on_load: bool,
}

impl MockConfig {
    pub fn with_messages(mut self, messages: Vec<Value>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str, Generation) -> Vec<Value> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.message_delay = delay;
        self
    }

    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_on_load = true;
        self
    }
}

/// A document load captured by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLoad {
    pub generation: Generation,
    pub document: String,
}

/// Mock boundary for testing
#[derive(Clone, Default)]
pub struct MockBoundary {
    config: MockConfig,
    loads: Arc<Mutex<Vec<CapturedLoad>>>,
    teardowns: Arc<Mutex<Vec<Generation>>>,
}

impl MockBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure messages to emit (convenience method)
    pub fn with_messages(mut self, messages: Vec<Value>) -> Self {
        self.config.messages = messages;
        self
    }

    /// Every load so far, oldest first
    pub fn loads(&self) -> Vec<CapturedLoad> {
        self.loads.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.lock().len()
    }

    pub fn last_load(&self) -> Option<CapturedLoad> {
        self.loads.lock().last().cloned()
    }

    /// Generations torn down so far, in order
    pub fn teardowns(&self) -> Vec<Generation> {
        self.teardowns.lock().clone()
    }
}

#[async_trait]
impl BoundaryBackend for MockBoundary {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn load(
        &self,
        document: &SynthesizedDocument,
        generation: Generation,
    ) -> Result<BoundaryHandle, BoundaryError> {
        self.loads.lock().push(CapturedLoad {
            generation,
            document: document.as_str().to_owned(),
        });

        if self.config.fail_on_load {
            return Err(BoundaryError::Backend("mock-failure".into()));
        }

        let messages = match &self.config.responder {
            Some(responder) => responder(document.as_str(), generation),
            None => self.config.messages.clone(),
        };
        let delay = self.config.message_delay;
        let hold_open = self.config.hold_open;

        let (tx, rx) = mpsc::channel(64);
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            for message in messages {
                if delay > Duration::ZERO {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = &mut kill_rx => return,
                    }
                }
                if tx.send(message).await.is_err() {
                    return;
                }
            }
            if hold_open {
                let _ = kill_rx.await;
            }
        });

        Ok(BoundaryHandle::new(generation, rx, None).with_kill_switch(kill_tx))
    }

    async fn teardown(&self, handle: &mut BoundaryHandle) -> Result<(), BoundaryError> {
        self.teardowns.lock().push(handle.generation);
        handle.terminate();
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Builder for wire message sequences, in the shape the shim posts
#[derive(Debug, Default)]
pub struct MockMessageBuilder {
    messages: Vec<Value>,
}

impl MockMessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn console(mut self, method: &str, args: &[&str]) -> Self {
        self.messages.push(json!({
            "type": "console",
            "method": method,
            "args": args,
        }));
        self
    }

    pub fn clear(self) -> Self {
        self.console("clear", &[])
    }

    pub fn log(self, args: &[&str]) -> Self {
        self.console("log", args)
    }

    pub fn info(self, args: &[&str]) -> Self {
        self.console("info", args)
    }

    pub fn warn(self, args: &[&str]) -> Self {
        self.console("warn", args)
    }

    pub fn error(self, args: &[&str]) -> Self {
        self.console("error", args)
    }

    /// Same as a console message, with an explicit emission timestamp
    pub fn at(mut self, method: &str, args: &[&str], timestamp: &str) -> Self {
        self.messages.push(json!({
            "type": "console",
            "method": method,
            "args": args,
            "timestamp": timestamp,
        }));
        self
    }

    /// Arbitrary message, e.g. noise from an unrelated sender
    pub fn raw(mut self, value: Value) -> Self {
        self.messages.push(value);
        self
    }

    pub fn build(self) -> Vec<Value> {
        self.messages
    }
}
