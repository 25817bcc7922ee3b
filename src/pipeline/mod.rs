// src/pipeline/mod.rs

//! Composition of tasks into what the CLI runs.
//!
//! - [`plan`] turns a CLI target into a [`Pipeline`].
//! - [`runner`] executes it: series pipelines as ordered awaits, parallel
//!   ones as a dev session around the event-driven runtime.

pub mod plan;
pub mod runner;

pub use plan::{Mode, Pipeline, Step};
pub use runner::{run_pipeline, run_series};
