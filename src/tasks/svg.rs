// src/tasks/svg.rs

//! SVG markup helpers built on `quick-xml`: minification for the image
//! optimizer, root splitting and id namespacing for the sprite generator.

use std::collections::BTreeSet;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::{Captures, Regex};

/// Elements dropped together with their content.
const DROPPED_ELEMENTS: &[&[u8]] = &[b"metadata", b"sodipodi:namedview"];

/// Minify SVG markup.
///
/// - declarations, comments, doctypes and processing instructions go
/// - whitespace-only text nodes go
/// - editor metadata elements go
/// - with `remove_viewbox`, a root `viewBox` equal to `0 0 width height` goes
///
/// Element ids are never touched.
pub fn minify_svg(source: &str, remove_viewbox: bool) -> Result<String, String> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new(Vec::new());

    let mut skip_depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {e}", reader.buffer_position()))?;
        let written = match event {
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::DocType(_) | Event::PI(_) => Ok(()),
            Event::Start(e) => {
                if skip_depth > 0 || is_dropped(&e) {
                    skip_depth += 1;
                    continue;
                }
                if seen_root {
                    writer.write_event(Event::Start(e))
                } else {
                    seen_root = true;
                    writer.write_event(Event::Start(normalize_root(&e, remove_viewbox)?))
                }
            }
            Event::Empty(e) => {
                if skip_depth > 0 || is_dropped(&e) {
                    continue;
                }
                if seen_root {
                    writer.write_event(Event::Empty(e))
                } else {
                    seen_root = true;
                    writer.write_event(Event::Empty(normalize_root(&e, remove_viewbox)?))
                }
            }
            Event::End(e) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                writer.write_event(Event::End(e))
            }
            other => {
                if skip_depth > 0 {
                    continue;
                }
                writer.write_event(other)
            }
        };
        written.map_err(|e| e.to_string())?;
    }

    if !seen_root {
        return Err("no root element".to_string());
    }
    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

fn is_dropped(e: &BytesStart<'_>) -> bool {
    DROPPED_ELEMENTS.contains(&e.name().as_ref())
}

/// Rebuild the root start tag, optionally dropping a redundant `viewBox`.
fn normalize_root(e: &BytesStart<'_>, remove_viewbox: bool) -> Result<BytesStart<'static>, String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attrs = attributes(e)?;

    let drop_viewbox = remove_viewbox && viewbox_is_redundant(&attrs);

    let mut out = BytesStart::new(name);
    for (key, value) in &attrs {
        if drop_viewbox && key == "viewBox" {
            continue;
        }
        out.push_attribute((key.as_str(), value.as_str()));
    }
    Ok(out)
}

/// Unescaped `(key, value)` pairs of a start tag, in document order.
pub fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, String> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

pub fn attribute<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Parse a length like `24`, `24px` or `1.5`. Other units are rejected.
pub fn parse_length(value: &str) -> Option<f64> {
    let v = value.trim();
    let v = v.strip_suffix("px").unwrap_or(v);
    v.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a `viewBox` into `[min_x, min_y, width, height]`.
pub fn parse_viewbox(value: &str) -> Option<[f64; 4]> {
    let nums: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match nums.as_slice() {
        [x, y, w, h] => Some([*x, *y, *w, *h]),
        _ => None,
    }
}

fn viewbox_is_redundant(attrs: &[(String, String)]) -> bool {
    let (Some(vb), Some(w), Some(h)) = (
        attribute(attrs, "viewBox").and_then(parse_viewbox),
        attribute(attrs, "width").and_then(parse_length),
        attribute(attrs, "height").and_then(parse_length),
    ) else {
        return false;
    };
    vb[0] == 0.0 && vb[1] == 0.0 && vb[2] == w && vb[3] == h
}

/// A parsed SVG document split into its root attributes and inner markup.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgParts {
    pub root_attributes: Vec<(String, String)>,
    pub inner: String,
}

/// Minify `source` and split it at the root `<svg>` element.
pub fn split_root(source: &str) -> Result<SvgParts, String> {
    let minified = minify_svg(source, false)?;

    let mut reader = Reader::from_str(&minified);
    let mut writer = Writer::new(Vec::new());
    let mut root_attributes = None;
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        match event {
            Event::Eof => break,
            Event::Start(e) if root_attributes.is_none() => {
                check_root_name(&e)?;
                root_attributes = Some(attributes(&e)?);
            }
            Event::Empty(e) if root_attributes.is_none() => {
                check_root_name(&e)?;
                root_attributes = Some(attributes(&e)?);
                break;
            }
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e)).map_err(|e| e.to_string())?;
            }
            Event::End(e) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                writer.write_event(Event::End(e)).map_err(|e| e.to_string())?;
            }
            other => {
                writer.write_event(other).map_err(|e| e.to_string())?;
            }
        }
    }

    let root_attributes = root_attributes.ok_or_else(|| "no root element".to_string())?;
    let inner = String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())?;
    Ok(SvgParts {
        root_attributes,
        inner,
    })
}

fn check_root_name(e: &BytesStart<'_>) -> Result<(), String> {
    if e.local_name().as_ref() == b"svg" {
        Ok(())
    } else {
        Err(format!(
            "root element is <{}>, expected <svg>",
            String::from_utf8_lossy(e.name().as_ref())
        ))
    }
}

/// Prefix every id defined in `fragment` with `{prefix}-` and rewrite the
/// local references to them: `href`/`xlink:href="#id"` and `url(#id)` in
/// attributes or text.
///
/// References to ids the fragment does not define are left alone.
pub fn namespace_ids(fragment: &str, prefix: &str) -> Result<String, String> {
    let ids = defined_ids(fragment)?;
    if ids.is_empty() {
        return Ok(fragment.to_string());
    }
    let url = Regex::new(r#"url\(\s*(?P<q>['"]?)#(?P<id>[^'")\s]+)['"]?\s*\)"#)
        .map_err(|e| e.to_string())?;
    let renamer = IdRenamer {
        ids: &ids,
        prefix,
        url: &url,
    };

    let mut reader = Reader::from_str(fragment);
    let mut writer = Writer::new(Vec::new());
    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        let written = match event {
            Event::Eof => break,
            Event::Start(e) => writer.write_event(Event::Start(renamer.element(&e)?)),
            Event::Empty(e) => writer.write_event(Event::Empty(renamer.element(&e)?)),
            Event::Text(t) => {
                let rewritten = {
                    let text = t.unescape().map_err(|e| e.to_string())?;
                    text.contains("url(").then(|| renamer.urls(&text))
                };
                match rewritten {
                    Some(text) => writer.write_event(Event::Text(BytesText::new(&text))),
                    None => writer.write_event(Event::Text(t)),
                }
            }
            other => writer.write_event(other),
        };
        written.map_err(|e| e.to_string())?;
    }
    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

fn defined_ids(fragment: &str) -> Result<BTreeSet<String>, String> {
    let mut reader = Reader::from_str(fragment);
    let mut ids = BTreeSet::new();
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => {
                if let Some(id) = attribute(&attributes(&e)?, "id") {
                    ids.insert(id.to_string());
                }
            }
            _ => {}
        }
    }
    Ok(ids)
}

struct IdRenamer<'a> {
    ids: &'a BTreeSet<String>,
    prefix: &'a str,
    url: &'a Regex,
}

impl IdRenamer<'_> {
    fn rename(&self, id: &str) -> String {
        format!("{}-{id}", self.prefix)
    }

    fn element(&self, e: &BytesStart<'_>) -> Result<BytesStart<'static>, String> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut out = BytesStart::new(name);
        for (key, value) in attributes(e)? {
            let value = match key.as_str() {
                "id" if self.ids.contains(&value) => self.rename(&value),
                "href" | "xlink:href" => match value.strip_prefix('#') {
                    Some(target) if self.ids.contains(target) => {
                        format!("#{}", self.rename(target))
                    }
                    _ => value,
                },
                _ => self.urls(&value),
            };
            out.push_attribute((key.as_str(), value.as_str()));
        }
        Ok(out)
    }

    fn urls(&self, text: &str) -> String {
        self.url
            .replace_all(text, |caps: &Captures<'_>| {
                let id = &caps["id"];
                if self.ids.contains(id) {
                    format!("url({q}#{id}{q})", q = &caps["q"], id = self.rename(id))
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}
