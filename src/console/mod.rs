//! Console-style consumers of relayed output

use std::io::Write;

use chrono::Local;

use crate::relay::{ConsoleSignal, ConsoleSink, EventKind, RuntimeEvent};

/// Format one event as `HH:MM:SS.mmm [kind] message`.
///
/// Continuation lines of multi-line messages are indented under the first.
pub fn format_event(event: &RuntimeEvent) -> String {
    let time = event
        .emitted_at
        .with_timezone(&Local)
        .format("%H:%M:%S%.3f");
    let prefix = format!("{time} [{:<5}] ", event.kind.as_str());
    let indent = " ".repeat(prefix.len());
    let message = event.message();

    let mut out = prefix;
    for (i, line) in message.lines().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(&indent);
        }
        out.push_str(line);
    }
    out
}

/// In-memory console history, reset by every clear signal
#[derive(Debug, Default, Clone)]
pub struct ConsoleLog {
    entries: Vec<RuntimeEvent>,
    clears: usize,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RuntimeEvent] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of clear signals seen so far
    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Footer line, e.g. `1 errors, 2 warnings`
    pub fn summary(&self) -> String {
        format!(
            "{} errors, {} warnings",
            self.count(EventKind::Error),
            self.count(EventKind::Warn)
        )
    }

    pub fn apply(&mut self, signal: ConsoleSignal) {
        match signal {
            ConsoleSignal::Cleared { .. } => {
                self.entries.clear();
                self.clears += 1;
            }
            ConsoleSignal::Event(event) => self.entries.push(event),
        }
    }
}

impl ConsoleSink for ConsoleLog {
    fn deliver(&mut self, signal: ConsoleSignal) {
        self.apply(signal);
    }
}

/// Sink that writes each event to a writer as it arrives
pub struct ConsolePrinter<W> {
    writer: W,
    show_clears: bool,
}

impl<W: Write + Send + 'static> ConsolePrinter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            show_clears: false,
        }
    }

    /// Print a divider for every clear signal
    pub fn with_clear_markers(mut self) -> Self {
        self.show_clears = true;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> ConsoleSink for ConsolePrinter<W> {
    fn deliver(&mut self, signal: ConsoleSignal) {
        let result = match &signal {
            ConsoleSignal::Cleared { generation } if self.show_clears => {
                writeln!(self.writer, "--- console cleared ({generation}) ---")
            }
            ConsoleSignal::Cleared { .. } => Ok(()),
            ConsoleSignal::Event(event) => writeln!(self.writer, "{}", format_event(event)),
        };
        if let Err(e) = result.and_then(|_| self.writer.flush()) {
            tracing::warn!("Failed to write console output: {e}");
        }
    }
}
