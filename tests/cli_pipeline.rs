use std::str::FromStr;

use assetpipe::cli::{CliArgs, Target};
use assetpipe::logging::parse_level_str;
use assetpipe::pipeline::{Mode, Pipeline, Step};
use assetpipe::tasks::TaskName;
use clap::Parser;

#[test]
fn task_defaults_to_the_dev_pipeline() {
    let args = CliArgs::try_parse_from(["assetpipe"]).unwrap();

    assert_eq!(args.task, Target::Default);
    assert!(!args.dry_run);
    assert!(args.config.is_none());
}

#[test]
fn task_names_keep_their_camel_case() {
    for (name, target) in [
        ("htmlInclude", Target::HtmlInclude),
        ("cleanDist", Target::CleanDist),
        ("svgSprites", Target::SvgSprites),
        ("ttf2woff2", Target::Ttf2Woff2),
        ("browsersync", Target::Browsersync),
    ] {
        let args = CliArgs::try_parse_from(["assetpipe", name]).unwrap();
        assert_eq!(args.task, target, "{name}");
    }
    assert!(CliArgs::try_parse_from(["assetpipe", "compile"]).is_err());
}

#[test]
fn ambient_flags_parse() {
    let args = CliArgs::try_parse_from([
        "assetpipe",
        "build",
        "--config",
        "site/Assetpipe.toml",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(args.task, Target::Build);
    assert_eq!(args.config.as_deref(), Some("site/Assetpipe.toml"));
    assert!(args.log_level.is_some());
    assert!(args.dry_run);
}

#[test]
fn build_runs_its_stages_in_order() {
    let build = Pipeline::build();

    assert_eq!(build.mode, Mode::Series);
    assert_eq!(
        build.tasks().collect::<Vec<_>>(),
        vec![
            TaskName::CleanDist,
            TaskName::Images,
            TaskName::SvgSprites,
            TaskName::HtmlInclude,
            TaskName::Fonts,
            TaskName::Assemble,
        ]
    );
    assert!(!build.is_long_running());
}

#[test]
fn default_compiles_watches_and_serves() {
    let dev = Pipeline::for_target(Target::Default);

    assert_eq!(dev.mode, Mode::Parallel);
    assert!(dev.watches() && dev.serves());
    assert_eq!(
        dev.tasks().collect::<Vec<_>>(),
        vec![TaskName::Styles, TaskName::Scripts, TaskName::SvgSprites, TaskName::HtmlInclude]
    );
    assert_eq!(
        dev.to_string(),
        "default (Parallel): styles | scripts | svgSprites | htmlInclude | watching | browsersync"
    );
}

#[test]
fn services_and_single_tasks_map_to_small_pipelines() {
    let watching = Pipeline::for_target(Target::Watching);
    assert_eq!(watching.steps, vec![Step::Watch]);
    assert!(watching.is_long_running());

    let serve = Pipeline::for_target(Target::Browsersync);
    assert_eq!(serve.steps, vec![Step::Serve]);

    let woff = Pipeline::for_target(Target::Ttf2Woff);
    assert_eq!(woff.mode, Mode::Series);
    assert_eq!(woff.steps, vec![Step::Run(TaskName::Ttf2Woff)]);
}

#[test]
fn task_names_round_trip_through_strings() {
    for task in TaskName::ALL {
        assert_eq!(TaskName::from_str(task.as_str()), Ok(task));
    }
    assert!(TaskName::from_str("watching").is_err());
}

#[test]
fn log_levels_parse_loosely() {
    assert_eq!(parse_level_str(" Debug "), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level_str("warning"), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("loud"), None);
}
