// src/fs/mod.rs

//! Small filesystem helpers shared by the tasks.
//!
//! All errors are mapped to [`TaskError`] so task bodies can use `?`
//! directly. Directory listings are sorted to keep outputs reproducible.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::{TaskError, TaskResult};

/// Read a whole file; a missing file is reported as `MissingSource`.
pub fn read(path: &Path) -> TaskResult<Vec<u8>> {
    fs::read(path).map_err(|source| read_error(path, source))
}

/// Read a UTF-8 file; a missing file is reported as `MissingSource`.
pub fn read_to_string(path: &Path) -> TaskResult<String> {
    fs::read_to_string(path).map_err(|source| read_error(path, source))
}

fn read_error(path: &Path, source: io::Error) -> TaskError {
    if source.kind() == io::ErrorKind::NotFound {
        TaskError::MissingSource {
            path: path.to_path_buf(),
        }
    } else {
        TaskError::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write a file, creating parent directories as needed.
pub fn write(path: &Path, contents: &[u8]) -> TaskResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| TaskError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| TaskError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy one file, creating parent directories of `to` as needed.
pub fn copy(from: &Path, to: &Path) -> TaskResult<()> {
    let bytes = read(from)?;
    write(to, &bytes)
}

/// List regular files under `dir`, sorted.
///
/// - `recursive = false` lists only direct children.
/// - A missing `dir` yields an empty list: an empty source set is not an
///   error for the copy/optimize tasks.
pub fn collect_files(dir: &Path, recursive: bool) -> TaskResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }

    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = fs::read_dir(&current).map_err(|source| TaskError::Read {
            path: current.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| TaskError::Read {
                path: current.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                if recursive {
                    stack.push(path);
                }
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Like [`collect_files`] but keeps only files with the given extension
/// (case-insensitive, without the dot).
pub fn collect_files_with_extension(
    dir: &Path,
    extension: &str,
    recursive: bool,
) -> TaskResult<Vec<PathBuf>> {
    let files = collect_files(dir, recursive)?;
    Ok(files
        .into_iter()
        .filter(|p| has_extension(p, extension))
        .collect())
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to canonicalizing both sides when a plain `strip_prefix` fails
/// (symlinked temp dirs on macOS, for instance).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}
