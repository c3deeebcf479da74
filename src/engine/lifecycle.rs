use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::boundary::{BoundaryBackend, BoundaryHandle, Generation};
use crate::relay::{Envelope, GenerationGate};
use crate::source::SourceBundle;
use crate::synth::{synthesize, SynthesizedDocument};

/// A loaded boundary and the task forwarding its messages to the relay.
///
/// The forwarder is the boundary's listener; it never outlives the boundary.
struct LiveBoundary {
    handle: BoundaryHandle,
    forwarder: JoinHandle<()>,
}

/// Owns the single live boundary of one preview surface.
///
/// Every install, soft or hard, is a full replace: a new generation is
/// allocated and published to the gate, the old boundary and its listener
/// are torn down, and a fresh context is loaded.
pub struct PreviewEngine {
    backend: Arc<dyn BoundaryBackend>,
    gate: GenerationGate,
    relay_tx: mpsc::Sender<Envelope>,
    generation: Generation,
    document: Option<SynthesizedDocument>,
    live: Option<LiveBoundary>,
}

impl PreviewEngine {
    pub fn new(
        backend: Arc<dyn BoundaryBackend>,
        gate: GenerationGate,
        relay_tx: mpsc::Sender<Envelope>,
    ) -> Self {
        Self {
            backend,
            gate,
            relay_tx,
            generation: Generation::NONE,
            document: None,
            live: None,
        }
    }

    /// Most recently allocated generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Generation of the boundary currently running, if any
    pub fn live_generation(&self) -> Option<Generation> {
        self.live.as_ref().map(|live| live.handle.generation)
    }

    /// Document most recently installed
    pub fn document(&self) -> Option<&SynthesizedDocument> {
        self.document.as_ref()
    }

    /// Re-synthesize from `bundle` and replace the boundary
    pub async fn soft_reload(&mut self, bundle: &SourceBundle) -> Generation {
        let document = synthesize(bundle);
        tracing::debug!(bytes = document.len(), "Soft reload");
        self.install(document).await
    }

    /// Re-run the current document from scratch without re-synthesizing.
    ///
    /// Returns `None` when nothing has been installed yet.
    pub async fn hard_reload(&mut self) -> Option<Generation> {
        let document = self.document.clone()?;
        tracing::debug!("Hard reload");
        Some(self.install(document).await)
    }

    /// Wait until the live boundary's message stream ends.
    ///
    /// Returns at once when nothing is live.
    pub async fn wait_for_exit(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if live.forwarder.is_finished() {
            return;
        }
        if let Err(e) = (&mut live.forwarder).await {
            if !e.is_cancelled() {
                tracing::warn!(generation = %live.handle.generation, "Forwarder task failed: {e}");
            }
        }
    }

    /// Tear down the live boundary, if any
    pub async fn teardown(&mut self) {
        let Some(mut live) = self.live.take() else {
            return;
        };
        let generation = live.handle.generation;
        live.forwarder.abort();
        if let Err(e) = self.backend.teardown(&mut live.handle).await {
            tracing::warn!(%generation, "Boundary teardown failed: {e}");
        }
        tracing::debug!(%generation, "Boundary torn down");
    }

    async fn install(&mut self, document: SynthesizedDocument) -> Generation {
        let generation = self.generation.next();
        self.generation = generation;

        // Publish first so nothing from the old boundary is relayed past this point
        self.gate.advance(generation);
        self.teardown().await;

        let result = self.backend.load(&document, generation).await;
        self.document = Some(document);

        match result {
            Ok(mut handle) => {
                let forwarder = match handle.take_messages() {
                    Some(messages) => spawn_forwarder(generation, messages, self.relay_tx.clone()),
                    None => tokio::spawn(async {}),
                };
                tracing::debug!(%generation, backend = self.backend.name(), "Boundary loaded");
                self.live = Some(LiveBoundary { handle, forwarder });
            }
            Err(e) => {
                if self
                    .relay_tx
                    .send(Envelope::load_failed(generation, e.to_string()))
                    .await
                    .is_err()
                {
                    tracing::debug!(%generation, "Relay gone; load failure not reported");
                }
            }
        }

        generation
    }
}

impl Drop for PreviewEngine {
    fn drop(&mut self) {
        // Dropping the handle drops its kill switch, which stops the context
        if let Some(live) = self.live.take() {
            live.forwarder.abort();
        }
    }
}

fn spawn_forwarder(
    generation: Generation,
    mut messages: mpsc::Receiver<serde_json::Value>,
    relay_tx: mpsc::Sender<Envelope>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(value) = messages.recv().await {
            if relay_tx
                .send(Envelope::message(generation, value))
                .await
                .is_err()
            {
                break;
            }
        }
        tracing::debug!(%generation, "Boundary message stream ended");
    })
}
