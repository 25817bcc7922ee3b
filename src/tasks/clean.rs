// src/tasks/clean.rs

use std::fs;
use std::io;

use tracing::{debug, info};

use crate::errors::{TaskError, TaskResult};
use crate::project::Project;
use crate::tasks::{TaskName, TaskReport};

/// Remove the output tree. An absent tree is a no-op success.
pub fn clean_dist(project: &Project) -> TaskResult<TaskReport> {
    let dist = project.output_dir();
    match fs::remove_dir_all(&dist) {
        Ok(()) => info!(path = ?dist, "removed output directory"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = ?dist, "output directory already absent")
        }
        Err(source) => return Err(TaskError::Remove { path: dist, source }),
    }
    Ok(TaskReport::new(TaskName::CleanDist))
}
