// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::tasks::TaskName;

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build front-end assets: styles, scripts, images, sprites, includes and live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Task or pipeline to run. Defaults to the dev-watch pipeline.
    #[arg(value_enum, value_name = "TASK", default_value = "default")]
    pub task: Target,

    /// Path to the config file (TOML).
    ///
    /// When omitted, `Assetpipe.toml` in the current working directory is
    /// used if it exists; otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and print the pipeline plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Every name accepted on the command line.
///
/// Most map to a single [`TaskName`]; `watching` and `browsersync` are the
/// long-running services and `build` / `default` are the composites.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Target {
    #[value(name = "styles")]
    Styles,
    #[value(name = "watching")]
    Watching,
    #[value(name = "browsersync")]
    Browsersync,
    #[value(name = "scripts")]
    Scripts,
    #[value(name = "fonts")]
    Fonts,
    #[value(name = "htmlInclude")]
    HtmlInclude,
    #[value(name = "images")]
    Images,
    #[value(name = "cleanDist")]
    CleanDist,
    #[value(name = "svgSprites")]
    SvgSprites,
    #[value(name = "ttf2woff")]
    Ttf2Woff,
    #[value(name = "ttf2woff2")]
    Ttf2Woff2,
    #[value(name = "build")]
    Build,
    #[value(name = "default")]
    Default,
}

impl Target {
    /// The single task this target runs, if it is a plain task.
    pub fn as_task(self) -> Option<TaskName> {
        match self {
            Target::Styles => Some(TaskName::Styles),
            Target::Scripts => Some(TaskName::Scripts),
            Target::Fonts => Some(TaskName::Fonts),
            Target::HtmlInclude => Some(TaskName::HtmlInclude),
            Target::Images => Some(TaskName::Images),
            Target::CleanDist => Some(TaskName::CleanDist),
            Target::SvgSprites => Some(TaskName::SvgSprites),
            Target::Ttf2Woff => Some(TaskName::Ttf2Woff),
            Target::Ttf2Woff2 => Some(TaskName::Ttf2Woff2),
            Target::Watching | Target::Browsersync | Target::Build | Target::Default => None,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
