// src/engine/runtime.rs

use std::fmt;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::exec::ExecutorBackend;
use crate::server::ReloadNotifier;

use super::core::{CoreCommand, DevCore};
use super::RuntimeEvent;

/// IO shell around [`DevCore`].
///
/// Reads `RuntimeEvent`s, feeds them to the core and carries out the
/// resulting commands: tasks go to the executor backend, reload events to
/// the notifier (if a dev server is running).
pub struct Runtime<E: ExecutorBackend> {
    core: DevCore,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    notifier: Option<ReloadNotifier>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: DevCore,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        executor: E,
        notifier: Option<ReloadNotifier>,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            notifier,
        }
    }

    /// Main event loop. Returns when the core asks to stop or every event
    /// sender is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("dev runtime started");
        let mut abort = None;

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                match command {
                    CoreCommand::Dispatch(tasks) => {
                        debug!(?tasks, "dispatching tasks");
                        self.executor.spawn_tasks(tasks).await?;
                    }
                    CoreCommand::Notify(kind) => {
                        if let Some(notifier) = &self.notifier {
                            let clients = notifier.notify(kind);
                            debug!(event = kind.event_name(), clients, "reload notification sent");
                        }
                    }
                    CoreCommand::Abort(message) => abort = Some(message),
                }
            }

            if !step.keep_running {
                break;
            }
        }

        info!("dev runtime exiting");
        match abort {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }
}
