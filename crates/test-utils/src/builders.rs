#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use assetpipe::config::ProjectConfig;
use assetpipe::project::Project;
use image::{ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;

/// Scratch project tree on disk.
///
/// Files are written eagerly; `project()` snapshots the current config.
/// The directory is removed when the fixture drops.
pub struct ProjectFixture {
    dir: TempDir,
    config: ProjectConfig,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("creating temp project dir"),
            config: ProjectConfig::default(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root.
    pub fn file(self, rel: &str, contents: impl AsRef<[u8]>) -> Self {
        self.write(rel, contents);
        self
    }

    /// Write a file relative to the source tree (`app/` by default).
    pub fn source(self, rel: &str, contents: impl AsRef<[u8]>) -> Self {
        let rel = format!("{}/{rel}", self.config.paths.source.display());
        self.file(&rel, contents)
    }

    pub fn with_config(mut self, f: impl FnOnce(&mut ProjectConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Write (or overwrite) a file in place, for use after construction.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating fixture dirs");
        }
        fs::write(&path, contents).expect("writing fixture file");
        path
    }

    pub fn project(&self) -> Project {
        Project::new(self.dir.path(), self.config.clone())
    }

    /// Path under the output tree.
    pub fn output(&self, rel: &str) -> PathBuf {
        self.project().output_path(rel)
    }

    /// Sorted, forward-slash paths of every file under the output tree.
    pub fn output_files(&self) -> Vec<String> {
        let root = self.project().output_dir();
        let mut out = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(&root) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    /// A small but complete site: styles, scripts, markup with includes,
    /// icons, raster and vector images and a font.
    pub fn sample_site(self) -> Self {
        self.source(
            "scss/style.scss",
            "$accent: #c33;\n@import 'base';\n.btn { color: $accent; user-select: none; }\n\
             .layout { display: grid; grid-template-columns: repeat(2, 1fr); }\n\
             .cell { grid-column: 1 / 3; }\n",
        )
        .source("scss/_base.scss", "body { margin: 0; }\n")
        .source("js/main.js", "function greet(name) {\n  return 'hi ' + name;\n}\ngreet('x');\n")
        .source(
            "index.html",
            "<html><body>@include('partials/header.html', {\"title\": \"Home\"})<main></main></body></html>\n",
        )
        .source("about.html", "<html><body>@include('partials/header.html')</body></html>\n")
        .source("partials/header.html", "<header>@title</header>")
        .source("images/icons/home.svg", icon_svg("M0 0h24v24H0z"))
        .source("images/icons/Arrow Left.svg", icon_svg("M12 4l-8 8 8 8"))
        .source("images/logo.svg", icon_svg("M1 1h10v10H1z"))
        .source("images/photo.png", png_bytes(16, 16))
        .source("fonts/body.woff2", b"not-really-a-font")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A 24x24 icon with one path and editor noise around it.
pub fn icon_svg(path: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!-- exported -->\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"24\" height=\"24\" viewBox=\"0 0 24 24\">\n\
           <metadata>editor</metadata>\n\
           <path d=\"{path}\"/>\n\
         </svg>\n"
    )
}

/// A PNG with a simple gradient, deliberately stored with extra alpha.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 8) as u8, (y * 8) as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)
        .expect("encoding PNG fixture");
    out.into_inner()
}

/// A high-quality JPEG, so re-encoding at a lower quality shrinks it.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([((x * 13) ^ (y * 7)) as u8, (x * y) as u8, (x + y) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Jpeg(100))
        .expect("encoding JPEG fixture");
    out.into_inner()
}

/// A minimal TrueType sfnt with `head`, `glyf`, `loca` and a custom table.
///
/// Only the container is valid; table contents are filler, which is all the
/// WOFF wrappers look at (plus `head.fontRevision`).
pub fn ttf_bytes() -> Vec<u8> {
    let mut head = vec![0u8; 54];
    head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    head[4..8].copy_from_slice(&0x0002_0005u32.to_be_bytes());
    let tables: Vec<([u8; 4], Vec<u8>)> = vec![
        (*b"head", head),
        (*b"glyf", vec![7u8; 120]),
        (*b"loca", vec![0, 0, 0, 60, 0, 120]),
        (*b"zzzz", b"private table".to_vec()),
    ];

    let header_len = 12 + 16 * tables.len();
    let mut directory = Vec::new();
    let mut data = Vec::new();
    for (tag, body) in &tables {
        let offset = header_len + data.len();
        directory.extend_from_slice(tag);
        directory.extend_from_slice(&checksum(body).to_be_bytes());
        directory.extend_from_slice(&(offset as u32).to_be_bytes());
        directory.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend_from_slice(body);
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data);
    out
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |acc, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        acc.wrapping_add(u32::from_be_bytes(word))
    })
}
