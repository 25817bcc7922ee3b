// src/tasks/copy.rs

//! Verbatim staging: fonts and the final `build` assembly.

use std::path::Path;

use tracing::{debug, info};

use crate::errors::{TaskError, TaskResult};
use crate::fs;
use crate::project::Project;
use crate::tasks::{TaskName, TaskReport, scripts, styles};

/// Copy `<src>/fonts/**` to `<dist>/fonts/` unchanged.
pub fn stage_fonts(project: &Project) -> TaskResult<TaskReport> {
    let from = project.source_path("fonts");
    let to = project.output_path("fonts");
    let mut report = TaskReport::new(TaskName::Fonts);
    copy_tree(&from, &to, &mut report)?;
    Ok(report)
}

/// Stage the CSS and JS bundles into the output tree.
///
/// A prebuilt bundle at the same relative path under the source tree is
/// copied as-is; otherwise the bundle is produced by its transformer.
/// Fonts and markup were written by earlier `build` stages and are left
/// alone.
pub fn assemble(project: &Project) -> TaskResult<TaskReport> {
    let cfg = project.config();
    let mut report = TaskReport::new(TaskName::Assemble);

    report.extend(stage_bundle(project, &cfg.styles.output, styles::compile_styles)?);
    report.extend(stage_bundle(project, &cfg.scripts.output, scripts::bundle_scripts)?);

    info!(outputs = report.outputs.len(), "assembled bundles");
    Ok(report)
}

fn stage_bundle(
    project: &Project,
    rel_output: &str,
    build: fn(&Project) -> TaskResult<TaskReport>,
) -> TaskResult<TaskReport> {
    let prebuilt = project.source_path(rel_output);
    if prebuilt.is_file() {
        let target = project.output_path(rel_output);
        debug!(from = ?prebuilt, to = ?target, "copying prebuilt bundle");
        fs::copy(&prebuilt, &target)?;
        return Ok(TaskReport::new(TaskName::Assemble).with_output(target));
    }
    build(project)
}

/// Mirror every file under `from` into `to`.
fn copy_tree(from: &Path, to: &Path, report: &mut TaskReport) -> TaskResult<()> {
    for file in fs::collect_files(from, true)? {
        let rel = file.strip_prefix(from).map_err(|e| TaskError::malformed(&file, e))?;
        let target = to.join(rel);
        fs::copy(&file, &target)?;
        report.push(target);
    }
    Ok(())
}
