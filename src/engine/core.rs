// src/engine/core.rs

//! Pure core of the dev runtime.
//!
//! [`DevCore`] consumes [`RuntimeEvent`]s and returns the commands the IO
//! shell should carry out. It owns no channels and performs no IO, so its
//! semantics are testable without Tokio.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::engine::{RuntimeEvent, RuntimeOptions, TaskOutcome};
use crate::server::ReloadKind;
use crate::tasks::TaskName;

/// Side effects requested by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start these tasks now.
    Dispatch(Vec<TaskName>),
    /// Tell connected browsers to reload or re-fetch stylesheets.
    Notify(ReloadKind),
    /// A long-running service died; the session ends with this error.
    Abort(String),
}

/// Result of handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct DevCore {
    options: RuntimeOptions,
    /// Runs started but not yet completed, per task. Overlapping runs of one
    /// task are allowed, so counts can exceed one.
    in_flight: BTreeMap<TaskName, usize>,
}

impl DevCore {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            options,
            in_flight: BTreeMap::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn in_flight(&self, task: TaskName) -> usize {
        self.in_flight.get(&task).copied().unwrap_or(0)
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                info!(task = %task, ?reason, "task triggered");
                *self.in_flight.entry(task).or_insert(0) += 1;
                CoreStep::continue_with(vec![CoreCommand::Dispatch(vec![task])])
            }
            RuntimeEvent::TaskCompleted { task, outcome } => self.complete(task, outcome),
            RuntimeEvent::ServiceFailed { service, message } => CoreStep {
                commands: vec![CoreCommand::Abort(format!("{service}: {message}"))],
                keep_running: false,
            },
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested");
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }

    fn complete(&mut self, task: TaskName, outcome: TaskOutcome) -> CoreStep {
        if let Some(count) = self.in_flight.get_mut(&task) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&task);
            }
        }

        let mut commands = Vec::new();
        match outcome {
            TaskOutcome::Success => {
                info!(task = %task, "task completed successfully");
                if let Some(kind) = task.reload_kind() {
                    commands.push(CoreCommand::Notify(kind));
                }
            }
            TaskOutcome::Failed(message) => {
                warn!(task = %task, "task failed: {message}");
            }
        }

        let keep_running = !(self.options.exit_when_idle && self.is_idle());
        if !keep_running {
            info!("runtime idle and exit_when_idle=true, stopping");
        }
        CoreStep {
            commands,
            keep_running,
        }
    }
}
