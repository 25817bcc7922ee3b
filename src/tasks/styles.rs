// src/tasks/styles.rs

//! Sass → compressed, prefixed CSS.
//!
//! `grass` compiles the entry stylesheet; `lightningcss` then applies vendor
//! prefixes for the configured browserslist targets and minifies. When the
//! targets include Internet Explorer, grid declarations also get their
//! `-ms-grid` form.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

use crate::errors::{TaskError, TaskResult};
use crate::fs;
use crate::project::Project;
use crate::tasks::grid::lower_grid;
use crate::tasks::{TaskName, TaskReport};

pub fn compile_styles(project: &Project) -> TaskResult<TaskReport> {
    let cfg = &project.config().styles;
    let entry = project.source_path(&cfg.entry);
    if !entry.is_file() {
        return Err(TaskError::MissingSource { path: entry });
    }

    let css = compile_sass(&entry)?;
    let css = prefix_and_minify(&css, &cfg.browserslist, &entry)?;

    let out = project.output_path(&cfg.output);
    fs::write(&out, css.as_bytes())?;
    debug!(entry = ?entry, out = ?out, bytes = css.len(), "wrote stylesheet");

    Ok(TaskReport::new(TaskName::Styles).with_output(out))
}

/// Compile a Sass/SCSS entry file with the compressed output style.
pub fn compile_sass(entry: &Path) -> TaskResult<String> {
    let options = grass::Options::default().style(grass::OutputStyle::Compressed);
    grass::from_path(entry, &options).map_err(|e| TaskError::malformed(entry, e))
}

/// Add vendor prefixes (including `-ms-grid` for IE targets) for
/// `browserslist` and minify.
///
/// `origin` is only used for error messages.
pub fn prefix_and_minify(css: &str, browserslist: &[String], origin: &Path) -> TaskResult<String> {
    let browsers = Browsers::from_browserslist(browserslist.iter().map(String::as_str))
        .map_err(|e| TaskError::malformed(origin, format!("browserslist: {e}")))?;
    let targets_ie = browsers.is_some_and(|b| b.ie.is_some());
    let targets = Targets {
        browsers,
        ..Targets::default()
    };

    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: origin.display().to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| TaskError::malformed(origin, e))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| TaskError::malformed(origin, e))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TaskError::malformed(origin, e))?;

    if targets_ie {
        Ok(lower_grid(&printed.code))
    } else {
        Ok(printed.code)
    }
}
