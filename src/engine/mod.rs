// src/engine/mod.rs

//! Dev-session orchestration.
//!
//! - [`core`] is a pure state machine: events in, commands out.
//! - [`runtime`] is the async shell that reads events from a channel,
//!   dispatches tasks to an [`ExecutorBackend`](crate::exec::ExecutorBackend)
//!   and forwards reload notifications to connected browsers.

pub mod core;
pub mod runtime;

pub use self::core::{CoreCommand, CoreStep, DevCore};
pub use runtime::Runtime;

use crate::tasks::TaskName;

/// Reason why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Initial run when the dev session starts.
    Startup,
    FileWatch,
}

/// Result of one task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

/// Events sent into the runtime.
///
/// - the watcher and the session start-up send `TaskTriggered`
/// - the executor sends `TaskCompleted`
/// - the dev server sends `ServiceFailed` if it cannot keep serving
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    ServiceFailed {
        service: &'static str,
        message: String,
    },
    ShutdownRequested,
}

/// Options that influence how the runtime behaves.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Exit once no task is in flight. Used when the session neither watches
    /// nor serves.
    pub exit_when_idle: bool,
}
