pub mod boundary;
pub mod config;
pub mod console;
pub mod engine;
pub mod relay;
pub mod source;
pub mod synth;
pub mod util;

pub use boundary::{
    BoundaryBackend, BoundaryError, BoundaryHandle, Generation, ProcessBoundary, RuntimeCommand,
};
pub use config::Config;
pub use console::{ConsoleLog, ConsolePrinter};
pub use engine::{PreviewEngine, PreviewError, PreviewSurface, RefreshScheduler, SourceChange};
pub use relay::{ConsoleSignal, ConsoleSink, EventKind, MessageRelay, RuntimeEvent};
pub use source::{
    ExternalResource, FileSnippetStore, Snippet, SnippetStore, SourceBundle, SourceKind,
    SourceWatcher,
};
pub use synth::{synthesize, SynthesizedDocument};
