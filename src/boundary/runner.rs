use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::boundary::error::BoundaryError;
use crate::synth::SynthesizedDocument;

/// Identity of one boundary instance's lifetime.
///
/// Generations only ever increase on a given preview surface; anything
/// tagged with an older generation is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    /// The generation before any boundary has been installed
    pub const NONE: Generation = Generation(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Handle to a live boundary
pub struct BoundaryHandle {
    /// Generation this boundary was loaded as
    pub generation: Generation,
    /// Process ID when the boundary is backed by a process
    pub pid: Option<u32>,
    /// Raw wire messages posted by the document, in emission order
    messages: Option<mpsc::Receiver<serde_json::Value>>,
    /// Fires to tear the execution context down
    kill_tx: Option<oneshot::Sender<()>>,
}

impl BoundaryHandle {
    pub fn new(
        generation: Generation,
        messages: mpsc::Receiver<serde_json::Value>,
        pid: Option<u32>,
    ) -> Self {
        Self {
            generation,
            pid,
            messages: Some(messages),
            kill_tx: None,
        }
    }

    pub fn with_kill_switch(mut self, kill_tx: oneshot::Sender<()>) -> Self {
        self.kill_tx = Some(kill_tx);
        self
    }

    /// Take the message stream. Only the first caller gets it.
    pub fn take_messages(&mut self) -> Option<mpsc::Receiver<serde_json::Value>> {
        self.messages.take()
    }

    /// Signal the execution context to stop. Returns false if it was
    /// already signalled or has no kill switch.
    pub fn terminate(&mut self) -> bool {
        match self.kill_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

impl fmt::Debug for BoundaryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryHandle")
            .field("generation", &self.generation)
            .field("pid", &self.pid)
            .field("messages_taken", &self.messages.is_none())
            .finish()
    }
}

/// Trait for backends that can host a synthesized document in isolation
#[async_trait]
pub trait BoundaryBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Load a document into a fresh execution context.
    ///
    /// Every call creates a new context; nothing from a previous load
    /// survives.
    async fn load(
        &self,
        document: &SynthesizedDocument,
        generation: Generation,
    ) -> Result<BoundaryHandle, BoundaryError>;

    /// Tear down a live boundary
    async fn teardown(&self, handle: &mut BoundaryHandle) -> Result<(), BoundaryError> {
        if !handle.terminate() {
            tracing::debug!(
                generation = %handle.generation,
                backend = self.name(),
                "Execution context already gone at teardown"
            );
        }
        Ok(())
    }

    /// Check if the backend can currently load documents
    fn is_available(&self) -> bool;
}
