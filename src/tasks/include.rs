// src/tasks/include.rs

//! HTML file-include templating.
//!
//! Directive syntax, with the default `@` prefix:
//!
//! ```text
//! @include('partials/header.html')
//! @include('partials/card.html', { "title": "Hello", "meta": { "id": 3 } })
//! ```
//!
//! Paths resolve against the directory of the file containing the
//! directive. Inside an included fragment, `@title` or `@meta.id` is
//! replaced by the matching context value; unknown names are left as-is.
//! Nested includes inherit the outer context.

use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::{TaskError, TaskResult};
use crate::fs;
use crate::project::Project;
use crate::tasks::{TaskName, TaskReport, finish_partial};

/// Deepest include nesting accepted before the file is rejected.
pub const MAX_INCLUDE_DEPTH: usize = 32;

type Context = Map<String, Value>;

/// Render every top-level `*.html` of the source tree into the output tree.
pub fn include_html(project: &Project) -> TaskResult<TaskReport> {
    let source_dir = project.source_dir();
    let includer = Includer::new(&project.config().include.prefix)
        .map_err(|e| TaskError::malformed(&source_dir, e))?;

    let sources = fs::collect_files_with_extension(&source_dir, "html", false)?;
    let mut report = TaskReport::new(TaskName::HtmlInclude);
    let mut failures = Vec::new();

    for src in &sources {
        let Some(name) = src.file_name() else {
            continue;
        };
        match includer.render_file(src) {
            Ok(html) => {
                let out = project.output_dir().join(name);
                fs::write(&out, html.as_bytes())?;
                debug!(source = ?src, out = ?out, "rendered markup");
                report.push(out);
            }
            Err(err) => {
                warn!(source = ?src, error = %err, "include failed; no output written");
                failures.push(err);
            }
        }
    }

    finish_partial(TaskName::HtmlInclude, report, sources.len(), failures)
}

/// Compiled directive and variable patterns for one prefix.
#[derive(Debug, Clone)]
pub struct Includer {
    directive: Regex,
    variable: Regex,
}

impl Includer {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let p = regex::escape(prefix);
        let directive = Regex::new(&format!(r#"{p}include\(\s*['"](?P<path>[^'"]+)['"]\s*"#))?;
        let variable = Regex::new(&format!(r"{p}(?P<name>[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)"))?;
        Ok(Self {
            directive,
            variable,
        })
    }

    /// Read `path` and resolve all of its includes.
    pub fn render_file(&self, path: &Path) -> TaskResult<String> {
        let content = fs::read_to_string(path)?;
        let mut stack = vec![identity(path)];
        self.resolve(&content, parent_dir(path), path, &Context::new(), &mut stack)
    }

    /// Resolve includes in `content` as if it were the file `origin`.
    pub fn render_str(&self, content: &str, origin: &Path) -> TaskResult<String> {
        let mut stack = vec![identity(origin)];
        self.resolve(content, parent_dir(origin), origin, &Context::new(), &mut stack)
    }

    fn resolve(
        &self,
        content: &str,
        base_dir: &Path,
        origin: &Path,
        context: &Context,
        stack: &mut Vec<PathBuf>,
    ) -> TaskResult<String> {
        let mut out = String::with_capacity(content.len());
        let mut cursor = 0;

        while let Some(caps) = self.directive.captures_at(content, cursor) {
            let (Some(whole), Some(rel)) = (caps.get(0), caps.name("path")) else {
                break;
            };
            out.push_str(&content[cursor..whole.start()]);

            let (local, end) = parse_arguments(content, whole.end(), origin)?;
            let mut merged = context.clone();
            merged.extend(local);

            let fragment = base_dir.join(rel.as_str());
            out.push_str(&self.include_fragment(&fragment, origin, &merged, stack)?);
            cursor = end;
        }

        out.push_str(&content[cursor..]);
        Ok(out)
    }

    fn include_fragment(
        &self,
        fragment: &Path,
        origin: &Path,
        context: &Context,
        stack: &mut Vec<PathBuf>,
    ) -> TaskResult<String> {
        if !fragment.is_file() {
            return Err(TaskError::MissingInclude {
                from: origin.to_path_buf(),
                fragment: fragment.to_path_buf(),
            });
        }

        let key = identity(fragment);
        if stack.contains(&key) {
            let chain = stack
                .iter()
                .chain(std::iter::once(&key))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(TaskError::IncludeCycle { chain });
        }
        if stack.len() > MAX_INCLUDE_DEPTH {
            return Err(TaskError::malformed(
                origin,
                format!("includes nested deeper than {MAX_INCLUDE_DEPTH} levels"),
            ));
        }

        let raw = fs::read_to_string(fragment)?;
        let text = self.substitute(&raw, context);

        stack.push(key);
        let resolved = self.resolve(&text, parent_dir(fragment), fragment, context, stack);
        stack.pop();
        resolved
    }

    /// Replace `<prefix>name` tokens that name a context value.
    fn substitute(&self, text: &str, context: &Context) -> String {
        if context.is_empty() {
            return text.to_string();
        }
        self.variable
            .replace_all(text, |caps: &Captures| {
                let name = &caps["name"];
                if name == "include" {
                    return caps[0].to_string();
                }
                match lookup(context, name) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Parse the optional `, { ...json... }` argument and the closing `)`.
///
/// Returns the context and the byte offset just past the `)`.
fn parse_arguments(content: &str, start: usize, origin: &Path) -> TaskResult<(Context, usize)> {
    let mut i = skip_whitespace(content, start);
    let mut context = Context::new();

    if content[i..].starts_with(',') {
        i = skip_whitespace(content, i + 1);
        let len = json_object_len(&content[i..]).ok_or_else(|| {
            TaskError::malformed(origin, "include context must be a closed JSON object")
        })?;
        context = serde_json::from_str(&content[i..i + len])
            .map_err(|e| TaskError::malformed(origin, format!("include context: {e}")))?;
        i = skip_whitespace(content, i + len);
    }

    if !content[i..].starts_with(')') {
        return Err(TaskError::malformed(
            origin,
            "expected ')' to close include directive",
        ));
    }
    Ok((context, i + 1))
}

fn skip_whitespace(s: &str, from: usize) -> usize {
    let rest = &s[from..];
    from + (rest.len() - rest.trim_start().len())
}

/// Byte length of the balanced JSON object at the start of `s`.
fn json_object_len(s: &str) -> Option<usize> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in s.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn lookup<'a>(context: &'a Context, dotted: &str) -> Option<&'a Value> {
    let mut parts = dotted.split('.');
    let mut current = context.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
