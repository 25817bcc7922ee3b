// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from `Assetpipe.toml`.
///
/// ```toml
/// [paths]
/// source = "app"
/// output = "dist"
///
/// [styles]
/// browserslist = ["last 10 versions"]
///
/// [watch.scripts]
/// exclude = ["app/js/vendor/**"]
/// append_default_exclude = true
/// ```
///
/// Every section is optional; an empty file yields the stock layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub include: IncludeSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub sprites: SpritesSection,

    #[serde(default)]
    pub server: ServerSection,

    /// Watch rule overrides from `[watch.<task>]`, keyed by task name
    /// (`styles`, `scripts`, `htmlInclude`, `svgSprites`).
    #[serde(default)]
    pub watch: BTreeMap<String, WatchSection>,
}

/// `[paths]`: source and output trees, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("app")
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
        }
    }
}

/// `[styles]`. `entry` is relative to the source tree, `output` to the
/// output tree.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    #[serde(default = "default_style_entry")]
    pub entry: String,

    #[serde(default = "default_style_output")]
    pub output: String,

    /// Browserslist queries used for prefixing and syntax lowering.
    #[serde(default = "default_browserslist")]
    pub browserslist: Vec<String>,
}

fn default_style_entry() -> String {
    "scss/style.scss".to_string()
}

fn default_style_output() -> String {
    "css/style.min.css".to_string()
}

fn default_browserslist() -> Vec<String> {
    vec!["last 10 versions".to_string()]
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            entry: default_style_entry(),
            output: default_style_output(),
            browserslist: default_browserslist(),
        }
    }
}

/// `[scripts]`. Entries are concatenated in order before minification.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    #[serde(default = "default_script_entries")]
    pub entries: Vec<String>,

    #[serde(default = "default_script_output")]
    pub output: String,
}

fn default_script_entries() -> Vec<String> {
    vec!["js/main.js".to_string()]
}

fn default_script_output() -> String {
    "js/main.min.js".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            entries: default_script_entries(),
            output: default_script_output(),
        }
    }
}

/// `[include]`: directive marker for the HTML includer.
#[derive(Debug, Clone, Deserialize)]
pub struct IncludeSection {
    #[serde(default = "default_include_prefix")]
    pub prefix: String,
}

fn default_include_prefix() -> String {
    "@".to_string()
}

impl Default for IncludeSection {
    fn default() -> Self {
        Self {
            prefix: default_include_prefix(),
        }
    }
}

/// `[images]`: per-format optimizer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    /// JPEG re-encoding quality, 1..=100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// PNG optimization preset, 0..=6.
    #[serde(default = "default_png_level")]
    pub png_level: u8,

    /// Drop `viewBox` when it only restates `width`/`height`.
    #[serde(default = "default_true")]
    pub svg_remove_viewbox: bool,
}

fn default_jpeg_quality() -> u8 {
    75
}

fn default_png_level() -> u8 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            png_level: default_png_level(),
            svg_remove_viewbox: default_true(),
        }
    }
}

/// `[sprites]`. `icons` is relative to the source tree, `output` to the
/// output tree.
#[derive(Debug, Clone, Deserialize)]
pub struct SpritesSection {
    #[serde(default = "default_icons_dir")]
    pub icons: String,

    #[serde(default = "default_icons_dir")]
    pub output: String,

    #[serde(default = "default_sprite_name")]
    pub sprite: String,

    #[serde(default = "default_sprite_stylesheet")]
    pub stylesheet: String,

    #[serde(default = "default_class_prefix")]
    pub class_prefix: String,
}

fn default_icons_dir() -> String {
    "images/icons".to_string()
}

fn default_sprite_name() -> String {
    "sprite.svg".to_string()
}

fn default_sprite_stylesheet() -> String {
    "sprite.css".to_string()
}

fn default_class_prefix() -> String {
    "svg-".to_string()
}

impl Default for SpritesSection {
    fn default() -> Self {
        Self {
            icons: default_icons_dir(),
            output: default_icons_dir(),
            sprite: default_sprite_name(),
            stylesheet: default_sprite_stylesheet(),
            class_prefix: default_class_prefix(),
        }
    }
}

/// `[server]`: dev server bind address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[watch.<task>]`: overrides for one watch rule.
///
/// Patterns are relative to the project root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// If `None`, the built-in patterns for the task are used.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// If `None`, the built-in excludes for the task are used.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// If true, built-in patterns are appended to `watch`.
    #[serde(default)]
    pub append_default_watch: bool,

    /// If true, built-in excludes are appended to `exclude`.
    #[serde(default)]
    pub append_default_exclude: bool,

    /// Skip a run when the content of every matched file is unchanged.
    #[serde(default)]
    pub use_hash: bool,
}
