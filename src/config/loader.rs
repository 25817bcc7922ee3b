// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::config::model::ProjectConfig;
use crate::config::validate::validate_config;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "Assetpipe.toml";

/// Load a configuration file from a given path and return the raw
/// `ProjectConfig`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ProjectConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ProjectConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectConfig> {
    let config = load_from_path(&path)?;
    validate_config(&config)
        .with_context(|| format!("validating config {:?}", path.as_ref()))?;
    Ok(config)
}

/// Resolve the project root and its configuration.
///
/// - An explicit path must exist; its directory becomes the project root.
/// - Without one, `Assetpipe.toml` in the working directory is used when
///   present, otherwise the built-in defaults apply with the working
///   directory as root.
pub fn resolve_project_config(explicit: Option<&Path>) -> Result<(PathBuf, ProjectConfig)> {
    match explicit {
        Some(path) => {
            if !path.is_file() {
                bail!("config file {:?} does not exist", path);
            }
            let cfg = load_and_validate(path)?;
            Ok((config_root_dir(path), cfg))
        }
        None => {
            let cwd = current_dir();
            let candidate = cwd.join(DEFAULT_CONFIG_FILE);
            if candidate.is_file() {
                info!(config = ?candidate, "loading project config");
                let cfg = load_and_validate(&candidate)?;
                Ok((cwd, cfg))
            } else {
                debug!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
                let cfg = ProjectConfig::default();
                validate_config(&cfg)?;
                Ok((cwd, cfg))
            }
        }
    }
}

/// Directory containing the config file, or the working directory for a
/// bare file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => current_dir(),
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
