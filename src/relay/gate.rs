use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::boundary::Generation;

/// Shared record of the newest installed generation.
///
/// The engine advances it before tearing the previous boundary down; the
/// relay consults it for every envelope.
#[derive(Debug, Clone, Default)]
pub struct GenerationGate {
    current: Arc<AtomicU64>,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        Generation::new(self.current.load(Ordering::Acquire))
    }

    /// Move the gate forward. Never moves backwards.
    pub fn advance(&self, generation: Generation) {
        self.current
            .fetch_max(generation.value(), Ordering::AcqRel);
    }

    pub fn is_stale(&self, generation: Generation) -> bool {
        generation < self.current()
    }
}
