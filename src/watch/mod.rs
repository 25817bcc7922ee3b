// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Building the static watch-rule table (glob patterns → task).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optional content hashing so unchanged files don't re-run a task.
//!
//! It only turns filesystem changes into task-level triggers; what a task
//! does is up to the runtime and the executor.

pub mod hash;
pub mod patterns;
pub mod watcher;

pub use hash::{HashGate, compute_hash_for_paths};
pub use patterns::{WatchRule, build_watch_rules, collect_matching_files, default_patterns};
pub use watcher::{WatcherHandle, spawn_watcher, tasks_for_paths};
