//! Authored sources and the snippet store they are loaded from

pub mod bundle;
pub mod snippet;
pub mod watch;

pub use bundle::{ExternalResource, SourceBundle};
pub use snippet::{FileSnippetStore, Snippet, SnippetError, SnippetStore};
pub use watch::{SourceKind, SourceWatcher};
