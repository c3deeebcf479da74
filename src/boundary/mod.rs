//! Isolation boundary
//!
//! A boundary hosts one synthesized document in an execution context that
//! shares nothing with the host. The only way out is the structured message
//! stream carried by a [`BoundaryHandle`].

pub mod error;
pub mod harness;
pub mod mock;
pub mod process;
pub mod runner;
pub mod stream;

pub use error::BoundaryError;
pub use process::{ProcessBoundary, RuntimeCommand};
pub use runner::{BoundaryBackend, BoundaryHandle, Generation};
