use tokio::sync::mpsc;

use crate::relay::event::ConsoleSignal;

/// Consumer of relayed console output.
///
/// Called once per signal, in generation order. Ownership of each signal
/// passes to the sink; the relay keeps no history.
pub trait ConsoleSink: Send + 'static {
    fn deliver(&mut self, signal: ConsoleSignal);
}

impl ConsoleSink for mpsc::UnboundedSender<ConsoleSignal> {
    fn deliver(&mut self, signal: ConsoleSignal) {
        if self.send(signal).is_err() {
            tracing::trace!("Console sink receiver dropped");
        }
    }
}

impl ConsoleSink for Vec<ConsoleSignal> {
    fn deliver(&mut self, signal: ConsoleSignal) {
        self.push(signal);
    }
}
