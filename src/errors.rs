// src/errors.rs

//! Crate-wide error types.
//!
//! Individual tasks fail with a typed [`TaskError`]; orchestration layers
//! (config loading, pipelines, `main`) use `anyhow` and add context.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tasks::woff::FontError;
use crate::tasks::TaskName;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("source file not found: {path:?}")]
    MissingSource { path: PathBuf },

    #[error("reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("writing {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("removing {path:?}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {path:?}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("include {fragment:?} referenced from {from:?} does not exist")]
    MissingInclude { from: PathBuf, fragment: PathBuf },

    #[error("include cycle: {chain}")]
    IncludeCycle { chain: String },

    #[error("sprite identifier '{id}' derived from both {first:?} and {second:?}")]
    SpriteIdCollision {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("font {path:?}: {source}")]
    Font {
        path: PathBuf,
        #[source]
        source: FontError,
    },

    #[error("{count} of {total} files failed in {task}; first: {first}")]
    Partial {
        task: TaskName,
        count: usize,
        total: usize,
        first: Box<TaskError>,
    },

    #[error("task {task} did not finish: {message}")]
    Aborted { task: TaskName, message: String },
}

impl TaskError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        TaskError::Malformed {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub use anyhow::{Error, Result};

/// Result alias for task bodies.
pub type TaskResult<T> = std::result::Result<T, TaskError>;
