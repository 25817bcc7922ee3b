// src/tasks/grid.rs

//! `-ms-grid` declarations for Internet Explorer 10 and 11.
//!
//! Runs over printed CSS and inserts the IE form in front of every grid
//! declaration that has one:
//!
//! - `display:grid` / `inline-grid`
//! - explicit track lists, with `repeat(n, …)` rewritten to `(…)[n]`
//! - numeric line placement (`grid-row`, `grid-column`, `grid-area` and the
//!   `-start`/`-end` longhands) as a line plus a span
//!
//! Named lines and areas, auto-placement and `repeat(auto-fill, …)` have no
//! IE form and are left as they are.

/// Insert `-ms-grid` equivalents before the grid declarations in `css`.
pub fn lower_grid(css: &str) -> String {
    let mut out = String::with_capacity(css.len() + css.len() / 8);
    let mut copied = 0;
    let mut block_start = None;
    let mut quote = None;
    let mut escaped = false;

    for (i, ch) in css.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '{' => block_start = Some(i + 1),
            '}' => {
                // Only innermost blocks hold declarations.
                if let Some(start) = block_start.take() {
                    out.push_str(&css[copied..start]);
                    out.push_str(&lower_block(&css[start..i]));
                    copied = i;
                }
            }
            _ => {}
        }
    }
    out.push_str(&css[copied..]);
    out
}

fn lower_block(block: &str) -> String {
    let declarations = split_declarations(block);
    let mut lowered = Vec::with_capacity(declarations.len());

    for decl in &declarations {
        if let Some((name, value)) = decl.split_once(':') {
            let (value, important) = match value.trim_end().strip_suffix("!important") {
                Some(v) => (v.trim_end(), "!important"),
                None => (value, ""),
            };
            for (ms_name, ms_value) in ms_equivalents(name.trim(), value.trim()) {
                let ms = format!("{ms_name}:{ms_value}{important}");
                if !declarations.iter().any(|d| d.trim() == ms) {
                    lowered.push(ms);
                }
            }
        }
        lowered.push(decl.to_string());
    }
    lowered.join(";")
}

/// Split on top-level `;`. Joining the parts with `;` gives back `block`.
fn split_declarations(block: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in block.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                parts.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&block[start..]);
    parts
}

fn ms_equivalents(name: &str, value: &str) -> Vec<(&'static str, String)> {
    match name {
        "display" => match value {
            "grid" => vec![("display", "-ms-grid".to_string())],
            "inline-grid" => vec![("display", "-ms-inline-grid".to_string())],
            _ => Vec::new(),
        },
        "grid-template-columns" => ms_track_list(value)
            .map(|v| vec![("-ms-grid-columns", v)])
            .unwrap_or_default(),
        "grid-template-rows" => ms_track_list(value)
            .map(|v| vec![("-ms-grid-rows", v)])
            .unwrap_or_default(),
        "grid-column" => {
            let (start, end) = split_lines(value);
            placement(start, end, COLUMN)
        }
        "grid-row" => {
            let (start, end) = split_lines(value);
            placement(start, end, ROW)
        }
        "grid-area" => {
            let parts: Vec<&str> = value.split('/').map(str::trim).collect();
            let mut out = placement(parts[0], parts.get(2).copied(), ROW);
            if let Some(column) = parts.get(1) {
                out.extend(placement(column, parts.get(3).copied(), COLUMN));
            }
            out
        }
        "grid-column-start" => placement(value, None, COLUMN),
        "grid-row-start" => placement(value, None, ROW),
        "grid-column-end" => span_only(value, COLUMN),
        "grid-row-end" => span_only(value, ROW),
        _ => Vec::new(),
    }
}

/// IE property names for one axis: the start line and the span.
struct Axis {
    line: &'static str,
    span: &'static str,
}

const COLUMN: Axis = Axis {
    line: "-ms-grid-column",
    span: "-ms-grid-column-span",
};

const ROW: Axis = Axis {
    line: "-ms-grid-row",
    span: "-ms-grid-row-span",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Number(u32),
    Span(u32),
    Other,
}

fn parse_line(value: &str) -> Line {
    let value = value.trim();
    if let Some(n) = value.strip_prefix("span") {
        return match n.trim().parse() {
            Ok(n) if n > 0 => Line::Span(n),
            _ => Line::Other,
        };
    }
    match value.parse() {
        Ok(n) if n > 0 => Line::Number(n),
        _ => Line::Other,
    }
}

fn split_lines(value: &str) -> (&str, Option<&str>) {
    match value.split_once('/') {
        Some((start, end)) => (start.trim(), Some(end.trim())),
        None => (value.trim(), None),
    }
}

fn placement(start: &str, end: Option<&str>, axis: Axis) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();
    let span = match (parse_line(start), end.map(parse_line)) {
        (Line::Number(n), end) => {
            out.push((axis.line, n.to_string()));
            match end {
                Some(Line::Span(k)) => k,
                Some(Line::Number(e)) if e > n => e - n,
                _ => 1,
            }
        }
        (Line::Span(k), _) => k,
        (Line::Other, _) => 1,
    };
    if span > 1 {
        out.push((axis.span, span.to_string()));
    }
    out
}

fn span_only(value: &str, axis: Axis) -> Vec<(&'static str, String)> {
    match parse_line(value) {
        Line::Span(k) if k > 1 => vec![(axis.span, k.to_string())],
        _ => Vec::new(),
    }
}

/// The IE track list for `value`, or `None` if IE cannot express it.
fn ms_track_list(value: &str) -> Option<String> {
    const UNSUPPORTED: &[&str] = &["none", "[", "auto-fill", "auto-fit", "subgrid", "masonry"];
    if UNSUPPORTED.iter().any(|k| value.contains(k)) {
        return None;
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find("repeat(") {
        out.push_str(&rest[..at]);
        let body_start = at + "repeat(".len();
        let body_len = closing_paren(&rest[body_start..])?;
        let (count, tracks) = rest[body_start..body_start + body_len].split_once(',')?;
        let count: u32 = count.trim().parse().ok()?;
        out.push_str(&format!("({})[{count}]", tracks.trim()));
        rest = &rest[body_start + body_len + 1..];
    }
    out.push_str(rest);
    Some(out)
}

fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}
