// src/exec/mod.rs

//! Task execution layer.
//!
//! The dev runtime talks to an [`ExecutorBackend`] rather than running
//! tasks itself, so tests can swap in a fake that records dispatches.

pub mod backend;

pub use backend::{ExecutorBackend, TaskExecutor};
