// src/tasks/sprites.rs

//! SVG "stack" sprite generation.
//!
//! Every icon in the icons directory becomes a nested `<svg id="…">` inside
//! one sprite file. Only the fragment addressed by the URL (`:target`) is
//! displayed, so `sprite.svg#arrow` renders just the arrow icon. A companion
//! stylesheet maps `.svg-<id>` classes onto those fragments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{TaskError, TaskResult};
use crate::fs;
use crate::project::Project;
use crate::tasks::svg::{self, SvgParts};
use crate::tasks::{TaskName, TaskReport};

const SPRITE_STYLE: &str = ":root>svg{display:none}:root>svg:target{display:inline}";

/// Root attributes not carried over to the nested icon element.
const STRIPPED_ROOT_ATTRIBUTES: &[&str] = &["id", "x", "y", "version", "xmlns", "xml:space"];

/// One icon ready to be placed in the sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub id: String,
    pub source: PathBuf,
    pub view_box: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub attributes: Vec<(String, String)>,
    pub inner: String,
}

/// The rendered sprite and its stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub svg: String,
    pub css: String,
}

pub fn build_sprites(project: &Project) -> TaskResult<TaskReport> {
    let cfg = &project.config().sprites;
    let icons_dir = project.source_path(&cfg.icons);
    let files = fs::collect_files_with_extension(&icons_dir, "svg", false)?;

    let mut report = TaskReport::new(TaskName::SvgSprites);
    if files.is_empty() {
        debug!(dir = ?icons_dir, "no icons found; sprite not written");
        return Ok(report);
    }

    let icons = load_icons(&files)?;
    let sprite = render_sprite(&icons, &cfg.sprite, &cfg.class_prefix);

    let out_dir = project.output_path(&cfg.output);
    let sprite_path = out_dir.join(&cfg.sprite);
    let css_path = out_dir.join(&cfg.stylesheet);
    fs::write(&sprite_path, sprite.svg.as_bytes())?;
    fs::write(&css_path, sprite.css.as_bytes())?;
    debug!(icons = icons.len(), sprite = ?sprite_path, "wrote sprite");

    report.push(sprite_path);
    report.push(css_path);
    Ok(report)
}

/// Parse icon files, deriving ids and rejecting collisions.
///
/// The result is ordered by id so the sprite is byte-reproducible.
pub fn load_icons(files: &[PathBuf]) -> TaskResult<Vec<Icon>> {
    let mut by_id: BTreeMap<String, Icon> = BTreeMap::new();

    for file in files {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = sprite_id(&stem)
            .ok_or_else(|| TaskError::malformed(file, "cannot derive an identifier from the file name"))?;

        if let Some(existing) = by_id.get(&id) {
            return Err(TaskError::SpriteIdCollision {
                id,
                first: existing.source.clone(),
                second: file.clone(),
            });
        }

        let source = fs::read_to_string(file)?;
        let mut parts = svg::split_root(&source).map_err(|e| TaskError::malformed(file, e))?;
        parts.inner = svg::namespace_ids(&parts.inner, &id).map_err(|e| TaskError::malformed(file, e))?;
        by_id.insert(id.clone(), icon_from_parts(id, file, parts));
    }

    Ok(by_id.into_values().collect())
}

/// Derive a fragment identifier from an icon file stem.
///
/// Lower-cases and replaces every run of characters outside `[a-z0-9_-]`
/// with a single `-`. Runs at either end are dropped instead of replaced;
/// dashes from the stem itself are kept. Returns `None` when nothing is left.
pub fn sprite_id(stem: &str) -> Option<String> {
    let mut id = String::with_capacity(stem.len());
    let mut pending_dash = false;

    for ch in stem.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-' {
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.push(ch);
        } else {
            pending_dash = true;
        }
    }

    if id.is_empty() { None } else { Some(id) }
}

fn icon_from_parts(id: String, source: &Path, parts: SvgParts) -> Icon {
    let attrs = parts.root_attributes;
    let width = svg::attribute(&attrs, "width").and_then(svg::parse_length);
    let height = svg::attribute(&attrs, "height").and_then(svg::parse_length);

    let view_box = svg::attribute(&attrs, "viewBox")
        .map(str::to_string)
        .or_else(|| match (width, height) {
            (Some(w), Some(h)) => Some(format!("0 0 {} {}", fmt_number(w), fmt_number(h))),
            _ => None,
        });

    let (width, height) = match (width, height) {
        (Some(w), Some(h)) => (Some(w), Some(h)),
        _ => match view_box.as_deref().and_then(svg::parse_viewbox) {
            Some([_, _, w, h]) => (Some(w), Some(h)),
            None => (width, height),
        },
    };

    let attributes = attrs
        .into_iter()
        .filter(|(k, _)| {
            !STRIPPED_ROOT_ATTRIBUTES.contains(&k.as_str())
                && !k.starts_with("xmlns:")
                && k != "viewBox"
                && k != "width"
                && k != "height"
        })
        .collect();

    Icon {
        id,
        source: source.to_path_buf(),
        view_box,
        width,
        height,
        attributes,
        inner: parts.inner,
    }
}

/// Render the stack sprite and its stylesheet.
///
/// `sprite_name` is the file name the stylesheet references.
pub fn render_sprite(icons: &[Icon], sprite_name: &str, class_prefix: &str) -> Sprite {
    let mut svg = String::new();
    svg.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    svg.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#);
    svg.push_str(&format!("<style>{SPRITE_STYLE}</style>"));

    let mut css = String::new();

    for icon in icons {
        svg.push_str(&format!(r#"<svg id="{}""#, icon.id));
        if let Some(vb) = &icon.view_box {
            svg.push_str(&format!(r#" viewBox="{}""#, escape_attr(vb)));
        }
        let size = icon.width.zip(icon.height);
        if let Some((w, h)) = size {
            svg.push_str(&format!(r#" width="{}" height="{}""#, fmt_number(w), fmt_number(h)));
        }
        for (k, v) in &icon.attributes {
            svg.push_str(&format!(r#" {}="{}""#, k, escape_attr(v)));
        }
        svg.push_str(&format!(">{}</svg>", icon.inner));

        css.push_str(&format!(
            ".{class_prefix}{id}{{background:url(\"{sprite_name}#{id}\") no-repeat center/contain",
            id = icon.id
        ));
        if let Some((w, h)) = size {
            css.push_str(&format!(";width:{}px;height:{}px", fmt_number(w), fmt_number(h)));
        }
        css.push_str("}\n");
    }

    svg.push_str("</svg>");
    Sprite { svg, css }
}

fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
