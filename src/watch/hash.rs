// src/watch/hash.rs

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::tasks::TaskName;
use crate::watch::patterns::{WatchRule, collect_matching_files};

/// Compute a deterministic hash over the contents of the given files.
///
/// Order of `paths` does not matter; they are sorted before hashing. The
/// relative order of file boundaries is folded in via each path, so
/// renaming a file changes the hash as well.
pub fn compute_hash_for_paths<I, P>(paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut hasher = Hasher::new();

    let mut paths_vec: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    paths_vec.sort();

    for path in paths_vec {
        if path.is_file() {
            debug!("hashing file {:?}", path);
            hasher.update(path.to_string_lossy().as_bytes());
            let mut file = File::open(&path)
                .with_context(|| format!("opening file for hashing: {:?}", path))?;
            let mut buf = [0u8; 8192];
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
        }
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}

/// Per-task content hashes, kept for the lifetime of one dev session.
///
/// Only rules with `use_hash = true` are gated; every other rule always
/// passes. Nothing is persisted to disk.
#[derive(Debug)]
pub struct HashGate {
    root: PathBuf,
    search_dir: PathBuf,
    hashes: HashMap<TaskName, String>,
}

impl HashGate {
    pub fn new(root: impl Into<PathBuf>, search_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            search_dir: search_dir.into(),
            hashes: HashMap::new(),
        }
    }

    /// Record the current hash of every hashed rule, so the first real
    /// change after startup is compared against the initial state.
    pub fn seed(&mut self, rules: &[WatchRule]) -> Result<()> {
        for rule in rules.iter().filter(|r| r.use_hash()) {
            let hash = self.hash_rule(rule)?;
            self.hashes.insert(rule.task(), hash);
        }
        Ok(())
    }

    /// True if `rule`'s task should run: hashing is off for it, or the
    /// content of its matched files changed since the last call.
    pub fn should_run(&mut self, rule: &WatchRule) -> Result<bool> {
        if !rule.use_hash() {
            return Ok(true);
        }
        let hash = self.hash_rule(rule)?;
        let previous = self.hashes.insert(rule.task(), hash.clone());
        let changed = previous.as_deref() != Some(hash.as_str());
        if !changed {
            debug!(task = %rule.task(), "content hash unchanged; skipping");
        }
        Ok(changed)
    }

    fn hash_rule(&self, rule: &WatchRule) -> Result<String> {
        let files = collect_matching_files(&self.root, &self.search_dir, rule)?;
        compute_hash_for_paths(files)
    }
}
