// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::relative_str;
use crate::project::Project;
use crate::tasks::TaskName;

/// Compiled watch/exclude glob patterns for a single task.
///
/// Patterns are relative to the project root; `matches` takes a
/// forward-slash path relative to that root, e.g. `"app/scss/_base.scss"`.
#[derive(Clone)]
pub struct WatchRule {
    task: TaskName,
    patterns: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
    use_hash: bool,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("task", &self.task)
            .field("patterns", &self.patterns)
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    pub fn task(&self) -> TaskName {
        self.task
    }

    /// Effective watch patterns, for display.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// True if a change to `rel_path` should re-run this rule's task.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Built-in `(watch, exclude)` patterns for a watchable task.
pub fn default_patterns(project: &Project, task: TaskName) -> (Vec<String>, Vec<String>) {
    let src = project.source_glob_prefix();
    let cfg = project.config();
    match task {
        TaskName::Styles => {
            let dir = Path::new(&cfg.styles.entry)
                .parent()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .filter(|p| !p.is_empty());
            let pattern = match dir {
                Some(dir) => format!("{src}/{dir}/**/*.scss"),
                None => format!("{src}/**/*.scss"),
            };
            (vec![pattern], vec![])
        }
        TaskName::Scripts => (
            vec![format!("{src}/js/**/*.js")],
            vec![format!("{src}/{}", cfg.scripts.output)],
        ),
        TaskName::HtmlInclude => (vec![format!("{src}/*.html")], vec![]),
        TaskName::SvgSprites => (vec![format!("{src}/{}/*.svg", cfg.sprites.icons)], vec![]),
        _ => (vec![], vec![]),
    }
}

/// Build the watch-rule table: one rule per watchable task.
///
/// Per task, `[watch.<task>]` may override the built-in lists:
///
/// - With `append_default_watch = true`, the effective watch list is
///   `section.watch + builtin`.
/// - Else, if `section.watch` is set, only that list is used.
/// - Else, the built-in list is used.
///
/// Same rules for `exclude`.
pub fn build_watch_rules(project: &Project) -> Result<Vec<WatchRule>> {
    let watchable = TaskName::ALL.iter().copied().filter(|t| t.is_watchable());
    let mut rules = Vec::new();

    for task in watchable {
        let (default_watch, default_exclude) = default_patterns(project, task);
        let section = project.config().watch.get(task.as_str());

        let watch = effective_patterns(
            section.and_then(|s| s.watch.as_ref()),
            &default_watch,
            section.is_some_and(|s| s.append_default_watch),
        );
        let exclude = effective_patterns(
            section.and_then(|s| s.exclude.as_ref()),
            &default_exclude,
            section.is_some_and(|s| s.append_default_exclude),
        );

        let watch_set = build_globset(&watch)
            .with_context(|| format!("building watch globset for task {task}"))?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&exclude)
                    .with_context(|| format!("building exclude globset for task {task}"))?,
            )
        };

        rules.push(WatchRule {
            task,
            patterns: watch,
            watch_set,
            exclude_set,
            use_hash: section.is_some_and(|s| s.use_hash),
        });
    }

    Ok(rules)
}

fn effective_patterns(
    configured: Option<&Vec<String>>,
    builtin: &[String],
    append_builtin: bool,
) -> Vec<String> {
    match (configured, append_builtin) {
        (Some(list), true) => {
            let mut combined = list.clone();
            combined.extend(builtin.iter().cloned());
            combined
        }
        (Some(list), false) => list.clone(),
        (None, _) => builtin.to_vec(),
    }
}

/// Compile one pattern. `*` stays within a path segment; `**` crosses them.
pub fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat)?);
    }
    Ok(builder.build()?)
}

/// Collect all files under `search_dir` that `rule` matches, with paths
/// matched relative to `root`. Sorted.
pub fn collect_matching_files(
    root: &Path,
    search_dir: &Path,
    rule: &WatchRule,
) -> Result<Vec<PathBuf>> {
    let files = crate::fs::collect_files(search_dir, true)
        .with_context(|| format!("listing {:?}", search_dir))?;
    Ok(files
        .into_iter()
        .filter(|p| relative_str(root, p).is_some_and(|rel| rule.matches(&rel)))
        .collect())
}
