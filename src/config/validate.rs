// src/config/validate.rs

use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use lightningcss::targets::Browsers;

use crate::config::model::ProjectConfig;
use crate::tasks::TaskName;
use crate::watch::patterns::compile_glob;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - `[watch.<task>]` keys name a watchable task
/// - every watch/exclude glob compiles
/// - the browserslist queries resolve
/// - numeric ranges for image settings and the server port
/// - non-empty include prefix and script entry list
/// - the output directory is a plain relative path that neither is nor
///   contains the source tree, since `cleanDist` deletes it
pub fn validate_config(cfg: &ProjectConfig) -> Result<()> {
    validate_paths(cfg)?;
    validate_watch_sections(cfg)?;
    validate_styles(cfg)?;
    validate_scripts(cfg)?;
    validate_images(cfg)?;
    validate_misc(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &ProjectConfig) -> Result<()> {
    let output = &cfg.paths.output;
    let normalized = plain_relative(output).with_context(|| {
        format!(
            "[paths].output must be a relative path below the project root (got {:?})",
            output
        )
    })?;

    if let Some(source) = plain_relative(&cfg.paths.source) {
        if source.starts_with(&normalized) {
            bail!(
                "[paths].output {:?} would contain [paths].source {:?}; cleanDist would delete the sources",
                output,
                cfg.paths.source
            );
        }
    }
    Ok(())
}

/// `path` with `.` components dropped, or `None` if it is empty, absolute or
/// climbs with `..`.
fn plain_relative(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

fn validate_watch_sections(cfg: &ProjectConfig) -> Result<()> {
    for (name, section) in cfg.watch.iter() {
        let task = TaskName::from_str(name)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("invalid [watch.{name}] section"))?;
        if !task.is_watchable() {
            bail!("[watch.{name}]: task '{name}' has no watch rule");
        }

        let patterns = section
            .watch
            .iter()
            .flatten()
            .chain(section.exclude.iter().flatten());
        for pat in patterns {
            compile_glob(pat).with_context(|| format!("[watch.{name}]"))?;
        }
    }
    Ok(())
}

fn validate_styles(cfg: &ProjectConfig) -> Result<()> {
    if cfg.styles.browserslist.is_empty() {
        bail!("[styles].browserslist must contain at least one query");
    }
    Browsers::from_browserslist(cfg.styles.browserslist.iter().map(String::as_str))
        .map_err(|e| anyhow!("{e}"))
        .context("invalid [styles].browserslist")?;
    Ok(())
}

fn validate_scripts(cfg: &ProjectConfig) -> Result<()> {
    if cfg.scripts.entries.is_empty() {
        bail!("[scripts].entries must contain at least one file");
    }
    Ok(())
}

fn validate_images(cfg: &ProjectConfig) -> Result<()> {
    let quality = cfg.images.jpeg_quality;
    if !(1..=100).contains(&quality) {
        bail!("[images].jpeg_quality must be within 1..=100 (got {quality})");
    }
    let level = cfg.images.png_level;
    if level > 6 {
        bail!("[images].png_level must be within 0..=6 (got {level})");
    }
    Ok(())
}

fn validate_misc(cfg: &ProjectConfig) -> Result<()> {
    if cfg.include.prefix.is_empty() {
        bail!("[include].prefix must not be empty");
    }
    if cfg.server.port == 0 {
        bail!("[server].port must be non-zero");
    }
    if cfg.sprites.sprite.is_empty() || cfg.sprites.stylesheet.is_empty() {
        bail!("[sprites].sprite and [sprites].stylesheet must not be empty");
    }
    Ok(())
}
