//! Integration tests for the preview pipeline
//!
//! These tests drive a whole preview surface (scheduler, engine, relay) over
//! the mock boundary, run synthesized documents under node, and exercise the
//! CLI binary end to end.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod preview_surface;
pub mod shim_runtime;
