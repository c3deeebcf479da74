//! Preview engine
//!
//! Wires the pieces of one preview surface together:
//!
//! ```text
//! edits -> RefreshScheduler -> PreviewEngine -> boundary -> MessageRelay -> sink
//! ```
//!
//! Each stage runs as its own task and talks to the next over a channel.

pub mod lifecycle;
pub mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::boundary::BoundaryBackend;
use crate::relay::{ConsoleSink, GenerationGate, MessageRelay};
use crate::source::SourceBundle;

pub use lifecycle::PreviewEngine;
pub use scheduler::{
    RefreshCommand, RefreshScheduler, SchedulerInput, SourceChange, DEFAULT_QUIET_PERIOD,
};

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("Preview surface has shut down")]
    Closed,
}

/// A running preview surface
pub struct PreviewSurface<S> {
    inputs: mpsc::Sender<SchedulerInput>,
    scheduler: JoinHandle<()>,
    engine: JoinHandle<()>,
    relay: JoinHandle<S>,
}

impl<S: ConsoleSink> PreviewSurface<S> {
    /// Start a surface and immediately load `initial`
    pub fn spawn(
        backend: Arc<dyn BoundaryBackend>,
        initial: SourceBundle,
        quiet_period: Duration,
        sink: S,
    ) -> Self {
        let gate = GenerationGate::new();

        let (relay_tx, relay_rx) = mpsc::channel(1024);
        let relay = tokio::spawn(MessageRelay::new(gate.clone(), sink).run(relay_rx));

        let (inputs, input_rx) = mpsc::channel(256);
        let (command_tx, mut command_rx) = mpsc::channel(16);
        let scheduler = tokio::spawn(
            RefreshScheduler::new(quiet_period, initial.clone()).run(input_rx, command_tx),
        );

        let mut engine = PreviewEngine::new(backend, gate, relay_tx);
        let engine = tokio::spawn(async move {
            engine.soft_reload(&initial).await;
            while let Some(command) = command_rx.recv().await {
                match command {
                    RefreshCommand::Soft(bundle) => {
                        engine.soft_reload(&bundle).await;
                    }
                    RefreshCommand::Hard => {
                        if engine.hard_reload().await.is_none() {
                            tracing::debug!("Hard refresh ignored; nothing loaded yet");
                        }
                    }
                }
            }
            engine.teardown().await;
        });

        Self {
            inputs,
            scheduler,
            engine,
            relay,
        }
    }

    async fn send(&self, input: SchedulerInput) -> Result<(), PreviewError> {
        self.inputs
            .send(input)
            .await
            .map_err(|_| PreviewError::Closed)
    }

    /// Record an edit; the reload follows after the quiet period
    pub async fn edit(&self, change: SourceChange) -> Result<(), PreviewError> {
        self.send(SchedulerInput::Change(change)).await
    }

    /// Re-synthesize and reload now
    pub async fn refresh(&self) -> Result<(), PreviewError> {
        self.send(SchedulerInput::Refresh).await
    }

    /// Reload the current document unchanged, resetting page state
    pub async fn hard_refresh(&self) -> Result<(), PreviewError> {
        self.send(SchedulerInput::HardRefresh).await
    }

    /// Stop every stage and hand back the sink
    pub async fn shutdown(self) -> Option<S> {
        drop(self.inputs);
        if let Err(e) = self.scheduler.await {
            tracing::warn!("Scheduler task failed: {e}");
        }
        if let Err(e) = self.engine.await {
            tracing::warn!("Engine task failed: {e}");
        }
        match self.relay.await {
            Ok(sink) => Some(sink),
            Err(e) => {
                tracing::warn!("Relay task failed: {e}");
                None
            }
        }
    }
}
