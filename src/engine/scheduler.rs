use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::source::{ExternalResource, SourceBundle};

/// Default quiet period between the last edit and the reload it triggers
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// An edit to one of the host-owned source buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChange {
    Markup(String),
    Style(String),
    Script(String),
    Resources(Vec<ExternalResource>),
    /// Replace everything at once, e.g. after loading a snippet
    Bundle(SourceBundle),
}

impl SourceChange {
    /// Apply to the working buffers. Returns false if nothing changed.
    fn apply(self, sources: &mut SourceBundle) -> bool {
        fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        }

        match self {
            SourceChange::Markup(markup) => set(&mut sources.markup, markup),
            SourceChange::Style(style) => set(&mut sources.style, style),
            SourceChange::Script(script) => set(&mut sources.script, script),
            SourceChange::Resources(resources) => set(&mut sources.external_resources, resources),
            SourceChange::Bundle(bundle) => set(sources, bundle),
        }
    }
}

/// Input to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerInput {
    Change(SourceChange),
    /// Explicit soft refresh: bypasses the debounce
    Refresh,
    /// Explicit hard refresh: re-run the current document unchanged
    HardRefresh,
}

/// What the scheduler asks the engine to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshCommand {
    Soft(SourceBundle),
    Hard,
}

/// Trailing-edge debounce over source edits.
///
/// Each change pushes the deadline out to `quiet_period` after itself; the
/// reload fires only once the sources have been quiet that long. Explicit
/// refreshes fire immediately and cancel any pending soft reload.
pub struct RefreshScheduler {
    quiet_period: Duration,
    sources: SourceBundle,
    deadline: Option<Instant>,
}

impl RefreshScheduler {
    pub fn new(quiet_period: Duration, sources: SourceBundle) -> Self {
        Self {
            quiet_period,
            sources,
            deadline: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Current working buffers
    pub fn sources(&self) -> &SourceBundle {
        &self.sources
    }

    /// When the pending soft reload will fire, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Process one input observed at `now`
    pub fn handle(&mut self, input: SchedulerInput, now: Instant) -> Option<RefreshCommand> {
        match input {
            SchedulerInput::Change(change) => {
                if change.apply(&mut self.sources) {
                    self.deadline = Some(now + self.quiet_period);
                }
                None
            }
            SchedulerInput::Refresh => {
                self.deadline = None;
                Some(RefreshCommand::Soft(self.sources.clone()))
            }
            // A pending soft reload stays pending: it carries edits the
            // hard reload does not.
            SchedulerInput::HardRefresh => Some(RefreshCommand::Hard),
        }
    }

    /// Fire the pending soft reload if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<RefreshCommand> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                Some(RefreshCommand::Soft(self.sources.clone()))
            }
            _ => None,
        }
    }

    /// Drive the scheduler until the input channel closes.
    ///
    /// A soft reload still pending when inputs close is dropped.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<SchedulerInput>,
        commands: mpsc::Sender<RefreshCommand>,
    ) {
        loop {
            let input = match self.deadline {
                Some(deadline) => tokio::select! {
                    input = inputs.recv() => input,
                    _ = tokio::time::sleep_until(deadline) => {
                        if let Some(command) = self.poll(Instant::now()) {
                            tracing::debug!("Debounced soft reload");
                            if commands.send(command).await.is_err() {
                                break;
                            }
                        }
                        continue;
                    }
                },
                None => inputs.recv().await,
            };

            let Some(input) = input else {
                break;
            };
            if let Some(command) = self.handle(input, Instant::now()) {
                tracing::debug!(?command, "Immediate refresh");
                if commands.send(command).await.is_err() {
                    break;
                }
            }
        }
        tracing::debug!("Refresh scheduler stopped");
    }
}
