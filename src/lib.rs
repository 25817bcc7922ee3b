// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod project;
pub mod server;
pub mod tasks;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::resolve_project_config;
use crate::pipeline::{Pipeline, run_pipeline};
use crate::project::Project;
use crate::watch::build_watch_rules;

/// High-level entry point used by `main.rs`.
///
/// Resolves the project configuration, picks the pipeline for the CLI
/// target and runs it.
pub async fn run(args: CliArgs) -> Result<()> {
    let (root, cfg) = resolve_project_config(args.config.as_deref().map(Path::new))?;
    let project = Arc::new(Project::new(root, cfg));
    let pipeline = Pipeline::for_target(args.task);

    info!(root = ?project.root(), pipeline = %pipeline, "resolved project");

    if args.dry_run {
        print_dry_run(&project, &pipeline)?;
        return Ok(());
    }

    run_pipeline(&pipeline, project).await
}

/// Print the resolved configuration and the pipeline plan.
fn print_dry_run(project: &Project, pipeline: &Pipeline) -> Result<()> {
    let cfg = project.config();
    println!("assetpipe dry-run");
    println!("  root   = {}", project.root().display());
    println!("  source = {}", project.source_dir().display());
    println!("  output = {}", project.output_dir().display());
    println!();

    println!("styles:");
    println!("  entry: {}", cfg.styles.entry);
    println!("  output: {}", cfg.styles.output);
    println!("  browserslist: {:?}", cfg.styles.browserslist);
    println!("scripts:");
    println!("  entries: {:?}", cfg.scripts.entries);
    println!("  output: {}", cfg.scripts.output);
    println!("include.prefix: {}", cfg.include.prefix);
    println!(
        "images: jpeg_quality={} png_level={} svg_remove_viewbox={}",
        cfg.images.jpeg_quality, cfg.images.png_level, cfg.images.svg_remove_viewbox
    );
    println!(
        "sprites: {} -> {}/{{{}, {}}}",
        cfg.sprites.icons, cfg.sprites.output, cfg.sprites.sprite, cfg.sprites.stylesheet
    );
    println!("server: {}:{}", cfg.server.host, cfg.server.port);
    println!();

    println!("pipeline: {pipeline}");
    if pipeline.watches() {
        println!("watch rules:");
        for rule in build_watch_rules(project)? {
            println!("  - {}", rule.task());
            println!("      watch: {:?}", rule.patterns());
            if rule.use_hash() {
                println!("      use_hash: true");
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
