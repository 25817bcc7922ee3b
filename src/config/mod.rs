// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate basic invariants like glob syntax and value ranges (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_project_config};
pub use model::{
    ImagesSection, IncludeSection, PathsSection, ProjectConfig, ScriptsSection, ServerSection,
    SpritesSection, StylesSection, WatchSection,
};
pub use validate::validate_config;
