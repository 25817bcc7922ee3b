// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::fs::relative_str;
use crate::project::Project;
use crate::tasks::TaskName;
use crate::watch::hash::HashGate;
use crate::watch::patterns::WatchRule;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch the project's source tree recursively and send
/// `RuntimeEvent::TaskTriggered` for every rule a changed path matches.
///
/// Patterns are evaluated against paths relative to the project root. One
/// notify event triggers each task at most once, however many of its paths
/// match.
pub fn spawn_watcher(
    project: &Project,
    rules: Vec<WatchRule>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = canonical_or_self(project.root().to_path_buf());
    let source = canonical_or_self(project.source_dir());

    let mut gate = HashGate::new(root.clone(), source.clone());
    gate.seed(&rules).context("seeding watch hashes")?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher
        .watch(&source, RecursiveMode::Recursive)
        .with_context(|| format!("watching {:?}", source))?;

    info!("file watcher started on {:?}", source);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!("received notify event: {:?}", event);

            let triggered = tasks_for_paths(&root, &rules, &event.paths);
            for task in triggered {
                let Some(rule) = rules.iter().find(|r| r.task() == task) else {
                    continue;
                };
                match gate.should_run(rule) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => warn!(task = %task, "hash check failed: {err:#}"),
                }

                debug!(task = %task, "watch match -> triggering task");
                if runtime_tx
                    .send(RuntimeEvent::TaskTriggered {
                        task,
                        reason: TriggerReason::FileWatch,
                    })
                    .await
                    .is_err()
                {
                    debug!("runtime channel closed; stopping watcher loop");
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Tasks whose rules match any of `paths`, deduplicated, in rule order.
pub fn tasks_for_paths(root: &Path, rules: &[WatchRule], paths: &[PathBuf]) -> Vec<TaskName> {
    let rel_paths: Vec<String> = paths
        .iter()
        .filter_map(|path| {
            let rel = relative_str(root, path);
            if rel.is_none() {
                warn!("could not relativize path {:?} against root {:?}", path, root);
            }
            rel
        })
        .collect();

    let mut seen = BTreeSet::new();
    rules
        .iter()
        .filter(|rule| rel_paths.iter().any(|rel| rule.matches(rel)))
        .map(WatchRule::task)
        .filter(|task| seen.insert(*task))
        .collect()
}

fn canonical_or_self(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}
