// src/exec/backend.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::{Error, Result};
use crate::project::Project;
use crate::tasks::{TaskName, run_task};

/// Trait abstracting how dispatched tasks are executed.
///
/// Production code uses [`TaskExecutor`]; tests can provide an
/// implementation that records tasks and reports completion directly.
pub trait ExecutorBackend: Send {
    /// Start the given tasks. Completion is reported later through
    /// `RuntimeEvent::TaskCompleted`, not through the returned future.
    fn spawn_tasks(
        &mut self,
        tasks: Vec<TaskName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs each task in its own Tokio task against a shared project.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    project: Arc<Project>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl TaskExecutor {
    pub fn new(project: Arc<Project>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            project,
            runtime_tx,
        }
    }
}

impl ExecutorBackend for TaskExecutor {
    fn spawn_tasks(
        &mut self,
        tasks: Vec<TaskName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        for task in tasks {
            let project = Arc::clone(&self.project);
            let runtime_tx = self.runtime_tx.clone();
            tokio::spawn(async move {
                info!(task = %task, "starting task");
                let outcome = match run_task(task, project).await {
                    Ok(_) => TaskOutcome::Success,
                    Err(err) => {
                        error!(task = %task, "{err}");
                        TaskOutcome::Failed(err.to_string())
                    }
                };
                let _ = runtime_tx
                    .send(RuntimeEvent::TaskCompleted { task, outcome })
                    .await;
            });
        }
        Box::pin(std::future::ready(Ok::<(), Error>(())))
    }
}
