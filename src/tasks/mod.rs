// src/tasks/mod.rs

//! The fixed task set.
//!
//! Each task is a synchronous function over a [`Project`] that reads
//! sources and writes outputs. [`run_task`] moves the work onto Tokio's
//! blocking pool so pipelines and the dev runtime can await it.

pub mod clean;
pub mod copy;
pub mod grid;
pub mod images;
pub mod include;
pub mod scripts;
pub mod sprites;
pub mod styles;
pub mod svg;
pub mod woff;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{TaskError, TaskResult};
use crate::project::Project;
use crate::server::ReloadKind;

/// Every unit of work the pipelines and the watcher can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskName {
    CleanDist,
    Styles,
    Scripts,
    HtmlInclude,
    Images,
    SvgSprites,
    Fonts,
    Ttf2Woff,
    Ttf2Woff2,
    /// Final stage of `build`: stages the CSS and JS bundles.
    Assemble,
}

impl TaskName {
    pub const ALL: [TaskName; 10] = [
        TaskName::CleanDist,
        TaskName::Styles,
        TaskName::Scripts,
        TaskName::HtmlInclude,
        TaskName::Images,
        TaskName::SvgSprites,
        TaskName::Fonts,
        TaskName::Ttf2Woff,
        TaskName::Ttf2Woff2,
        TaskName::Assemble,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::CleanDist => "cleanDist",
            TaskName::Styles => "styles",
            TaskName::Scripts => "scripts",
            TaskName::HtmlInclude => "htmlInclude",
            TaskName::Images => "images",
            TaskName::SvgSprites => "svgSprites",
            TaskName::Fonts => "fonts",
            TaskName::Ttf2Woff => "ttf2woff",
            TaskName::Ttf2Woff2 => "ttf2woff2",
            TaskName::Assemble => "assemble",
        }
    }

    /// Whether a watch rule exists for this task.
    pub fn is_watchable(self) -> bool {
        matches!(
            self,
            TaskName::Styles | TaskName::Scripts | TaskName::HtmlInclude | TaskName::SvgSprites
        )
    }

    /// What connected browsers should do once this task completes, if
    /// anything.
    pub fn reload_kind(self) -> Option<ReloadKind> {
        match self {
            TaskName::Styles => Some(ReloadKind::InjectCss),
            TaskName::Scripts
            | TaskName::HtmlInclude
            | TaskName::SvgSprites
            | TaskName::Fonts => Some(ReloadKind::Reload),
            _ => None,
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskName::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown task name: {s}"))
    }
}

/// What a finished task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: TaskName,
    /// Files written, in the order they were written.
    pub outputs: Vec<PathBuf>,
}

impl TaskReport {
    pub fn new(task: TaskName) -> Self {
        Self {
            task,
            outputs: Vec::new(),
        }
    }

    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.outputs.push(path);
        self
    }

    pub fn push(&mut self, path: PathBuf) {
        self.outputs.push(path);
    }

    pub fn extend(&mut self, other: TaskReport) {
        self.outputs.extend(other.outputs);
    }
}

/// Run a task to completion on the current thread.
pub fn run_task_blocking(task: TaskName, project: &Project) -> TaskResult<TaskReport> {
    debug!(task = %task, "running task");
    let report = match task {
        TaskName::CleanDist => clean::clean_dist(project),
        TaskName::Styles => styles::compile_styles(project),
        TaskName::Scripts => scripts::bundle_scripts(project),
        TaskName::HtmlInclude => include::include_html(project),
        TaskName::Images => images::optimize_images(project),
        TaskName::SvgSprites => sprites::build_sprites(project),
        TaskName::Fonts => copy::stage_fonts(project),
        TaskName::Ttf2Woff => woff::convert_fonts(project, woff::FontFormat::Woff),
        TaskName::Ttf2Woff2 => woff::convert_fonts(project, woff::FontFormat::Woff2),
        TaskName::Assemble => copy::assemble(project),
    }?;
    info!(task = %task, outputs = report.outputs.len(), "task finished");
    Ok(report)
}

/// Run a task on the blocking pool.
pub async fn run_task(task: TaskName, project: Arc<Project>) -> TaskResult<TaskReport> {
    tokio::task::spawn_blocking(move || run_task_blocking(task, &project))
        .await
        .map_err(|e| TaskError::Aborted {
            task,
            message: e.to_string(),
        })?
}

/// Collapse per-file failures of a multi-file task into one error.
///
/// Files that succeeded have already been written.
pub(crate) fn finish_partial(
    task: TaskName,
    report: TaskReport,
    total: usize,
    mut failures: Vec<TaskError>,
) -> TaskResult<TaskReport> {
    if failures.is_empty() {
        return Ok(report);
    }
    let count = failures.len();
    let first = failures.remove(0);
    if total == 1 {
        return Err(first);
    }
    Err(TaskError::Partial {
        task,
        count,
        total,
        first: Box::new(first),
    })
}
