// src/tasks/scripts.rs

//! Concatenate the script entries and minify the result.

use minify_js::{Session, TopLevelMode, minify};
use tracing::debug;

use crate::errors::{TaskError, TaskResult};
use crate::fs;
use crate::project::Project;
use crate::tasks::{TaskName, TaskReport};

pub fn bundle_scripts(project: &Project) -> TaskResult<TaskReport> {
    let cfg = &project.config().scripts;

    let mut bundle = Vec::new();
    for entry in &cfg.entries {
        let path = project.source_path(entry);
        bundle.extend(fs::read(&path)?);
        bundle.push(b'\n');
    }

    let out = project.output_path(&cfg.output);
    let minified = minify_script(&bundle).map_err(|message| TaskError::Malformed {
        path: cfg
            .entries
            .first()
            .map(|e| project.source_path(e))
            .unwrap_or_else(|| project.source_dir()),
        message,
    })?;

    fs::write(&out, &minified)?;
    debug!(
        entries = cfg.entries.len(),
        before = bundle.len(),
        after = minified.len(),
        "wrote script bundle"
    );

    Ok(TaskReport::new(TaskName::Scripts).with_output(out))
}

/// Minify a classic (non-module) script.
pub fn minify_script(source: &[u8]) -> Result<Vec<u8>, String> {
    let session = Session::new();
    let mut out = Vec::new();
    minify(&session, TopLevelMode::Global, source, &mut out).map_err(|e| format!("{e:?}"))?;
    Ok(out)
}
