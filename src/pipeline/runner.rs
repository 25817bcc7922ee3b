// src/pipeline/runner.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::engine::{DevCore, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::exec::TaskExecutor;
use crate::pipeline::plan::{Mode, Pipeline, Step};
use crate::project::Project;
use crate::server::{self, ReloadNotifier};
use crate::tasks::{TaskReport, run_task};
use crate::watch::{build_watch_rules, spawn_watcher};

/// Run a pipeline to completion (or until Ctrl-C for long-running ones).
pub async fn run_pipeline(pipeline: &Pipeline, project: Arc<Project>) -> Result<()> {
    info!(pipeline = pipeline.name, "starting pipeline");
    match pipeline.mode {
        Mode::Series => run_series(pipeline, project).await.map(|_| ()),
        Mode::Parallel => run_session(pipeline, project).await,
    }
}

/// Run each task step in order, stopping at the first failure.
///
/// Watch and serve steps have no meaning in a series and are skipped.
pub async fn run_series(pipeline: &Pipeline, project: Arc<Project>) -> Result<Vec<TaskReport>> {
    let mut reports = Vec::new();
    for task in pipeline.tasks() {
        let report = run_task(task, Arc::clone(&project))
            .await
            .with_context(|| format!("task '{task}' failed"))?;
        reports.push(report);
    }
    info!(pipeline = pipeline.name, tasks = reports.len(), "pipeline finished");
    Ok(reports)
}

async fn run_session(pipeline: &Pipeline, project: Arc<Project>) -> Result<()> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let notifier = pipeline.serves().then(ReloadNotifier::default);
    let executor = TaskExecutor::new(Arc::clone(&project), rt_tx.clone());

    let _watcher = if pipeline.watches() {
        let rules = build_watch_rules(&project)?;
        Some(spawn_watcher(&project, rules, rt_tx.clone())?)
    } else {
        None
    };

    if let Some(notifier) = &notifier {
        let cfg = &project.config().server;
        let addr = server::resolve_addr(&cfg.host, cfg.port).await?;
        let root = project.output_dir();
        let notifier = notifier.clone();
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(err) = server::serve(addr, root, notifier).await {
                error!("dev server failed: {err:#}");
                let _ = tx
                    .send(RuntimeEvent::ServiceFailed {
                        service: "browsersync",
                        message: format!("{err:#}"),
                    })
                    .await;
            }
        });
    }

    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    for step in &pipeline.steps {
        if let Step::Run(task) = step {
            rt_tx
                .send(RuntimeEvent::TaskTriggered {
                    task: *task,
                    reason: TriggerReason::Startup,
                })
                .await?;
        }
    }
    drop(rt_tx);

    let options = RuntimeOptions {
        exit_when_idle: !pipeline.is_long_running(),
    };
    Runtime::new(DevCore::new(options), rt_rx, executor, notifier)
        .run()
        .await
}
