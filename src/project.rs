// src/project.rs

//! Resolved project: root directory plus configuration.

use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;

/// A project root with its configuration. Every task receives one.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Absolute (root-joined) source tree.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.source)
    }

    /// Absolute (root-joined) output tree.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.output)
    }

    pub fn source_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.source_dir().join(rel)
    }

    pub fn output_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.output_dir().join(rel)
    }

    /// Source tree as a forward-slash prefix for glob patterns, e.g. `app`.
    pub fn source_glob_prefix(&self) -> String {
        let s = self
            .config
            .paths
            .source
            .to_string_lossy()
            .replace('\\', "/");
        s.trim_end_matches('/').to_string()
    }
}
