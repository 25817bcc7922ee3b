// src/pipeline/plan.rs

use std::fmt;

use crate::cli::Target;
use crate::tasks::TaskName;

/// One element of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Run(TaskName),
    /// Watch the source tree and re-run matching tasks.
    Watch,
    /// Serve the output tree with live reload.
    Serve,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Run(task) => write!(f, "{task}"),
            Step::Watch => f.write_str("watching"),
            Step::Serve => f.write_str("browsersync"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Each step starts after the previous one succeeded.
    Series,
    /// Every step starts at once; failures don't affect siblings.
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub name: &'static str,
    pub mode: Mode,
    pub steps: Vec<Step>,
}

impl Pipeline {
    /// Production build from a clean output tree.
    pub fn build() -> Self {
        Self {
            name: "build",
            mode: Mode::Series,
            steps: vec![
                Step::Run(TaskName::CleanDist),
                Step::Run(TaskName::Images),
                Step::Run(TaskName::SvgSprites),
                Step::Run(TaskName::HtmlInclude),
                Step::Run(TaskName::Fonts),
                Step::Run(TaskName::Assemble),
            ],
        }
    }

    /// Dev session: initial compile, watch and serve.
    pub fn default_dev() -> Self {
        Self {
            name: "default",
            mode: Mode::Parallel,
            steps: vec![
                Step::Run(TaskName::Styles),
                Step::Run(TaskName::Scripts),
                Step::Run(TaskName::SvgSprites),
                Step::Run(TaskName::HtmlInclude),
                Step::Watch,
                Step::Serve,
            ],
        }
    }

    pub fn for_target(target: Target) -> Self {
        match target {
            Target::Build => Self::build(),
            Target::Default => Self::default_dev(),
            Target::Watching => Self::service("watching", Step::Watch),
            Target::Browsersync => Self::service("browsersync", Step::Serve),
            other => match other.as_task() {
                Some(task) => Self {
                    name: task.as_str(),
                    mode: Mode::Series,
                    steps: vec![Step::Run(task)],
                },
                None => Self::default_dev(),
            },
        }
    }

    fn service(name: &'static str, step: Step) -> Self {
        Self {
            name,
            mode: Mode::Parallel,
            steps: vec![step],
        }
    }

    /// Tasks run by this pipeline, in step order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskName> + '_ {
        self.steps.iter().filter_map(|s| match s {
            Step::Run(task) => Some(*task),
            _ => None,
        })
    }

    pub fn watches(&self) -> bool {
        self.steps.contains(&Step::Watch)
    }

    pub fn serves(&self) -> bool {
        self.steps.contains(&Step::Serve)
    }

    /// Whether the pipeline keeps running after its tasks finish.
    pub fn is_long_running(&self) -> bool {
        self.watches() || self.serves()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = match self.mode {
            Mode::Series => " -> ",
            Mode::Parallel => " | ",
        };
        let steps: Vec<String> = self.steps.iter().map(Step::to_string).collect();
        write!(f, "{} ({:?}): {}", self.name, self.mode, steps.join(sep))
    }
}
