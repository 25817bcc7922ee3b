// src/tasks/images.rs

//! Per-format image optimization over `<src>/images/**`.

use std::io::Cursor;
use std::path::Path;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::AnimationDecoder;
use tracing::{debug, trace};

use crate::config::ImagesSection;
use crate::errors::{TaskError, TaskResult};
use crate::fs;
use crate::project::Project;
use crate::tasks::svg::minify_svg;
use crate::tasks::{TaskName, TaskReport};

/// Formats the optimizer knows how to shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Jpeg,
    Png,
    Svg,
    /// Copied through unchanged.
    Other,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("gif") => ImageFormat::Gif,
            Some("jpg" | "jpeg") => ImageFormat::Jpeg,
            Some("png") => ImageFormat::Png,
            Some("svg") => ImageFormat::Svg,
            _ => ImageFormat::Other,
        }
    }
}

pub fn optimize_images(project: &Project) -> TaskResult<TaskReport> {
    let settings = &project.config().images;
    let from = project.source_path("images");
    let to = project.output_path("images");

    let mut report = TaskReport::new(TaskName::Images);
    let mut saved = 0i64;

    for file in fs::collect_files(&from, true)? {
        let rel = file
            .strip_prefix(&from)
            .map_err(|e| TaskError::malformed(&file, e))?;
        let original = fs::read(&file)?;
        let optimized = optimize_image(&file, &original, settings)?;
        saved += original.len() as i64 - optimized.len() as i64;

        let target = to.join(rel);
        fs::write(&target, &optimized)?;
        trace!(file = ?rel, before = original.len(), after = optimized.len(), "optimized image");
        report.push(target);
    }

    debug!(files = report.outputs.len(), bytes_saved = saved, "images optimized");
    Ok(report)
}

/// Optimize one image. Never returns something larger than `original`.
pub fn optimize_image(path: &Path, original: &[u8], settings: &ImagesSection) -> TaskResult<Vec<u8>> {
    let candidate = match ImageFormat::from_path(path) {
        ImageFormat::Gif => reencode_gif(original),
        ImageFormat::Jpeg => reencode_jpeg(original, settings.jpeg_quality),
        ImageFormat::Png => optimize_png(original, settings.png_level),
        ImageFormat::Svg => std::str::from_utf8(original)
            .map_err(|e| e.to_string())
            .and_then(|s| minify_svg(s, settings.svg_remove_viewbox))
            .map(String::into_bytes),
        ImageFormat::Other => return Ok(original.to_vec()),
    }
    .map_err(|message| TaskError::Malformed {
        path: path.to_path_buf(),
        message,
    })?;

    if candidate.len() < original.len() {
        Ok(candidate)
    } else {
        Ok(original.to_vec())
    }
}

fn reencode_jpeg(original: &[u8], quality: u8) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory_with_format(original, image::ImageFormat::Jpeg)
        .map_err(|e| e.to_string())?;
    let rgb = img.to_rgb8();
    let width = u16::try_from(rgb.width()).map_err(|_| format!("width {} too large", rgb.width()))?;
    let height = u16::try_from(rgb.height()).map_err(|_| format!("height {} too large", rgb.height()))?;

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality);
    encoder.set_progressive(true);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| e.to_string())?;
    Ok(out)
}

fn optimize_png(original: &[u8], level: u8) -> Result<Vec<u8>, String> {
    let options = oxipng::Options::from_preset(level);
    oxipng::optimize_from_memory(original, &options).map_err(|e| e.to_string())
}

fn reencode_gif(original: &[u8]) -> Result<Vec<u8>, String> {
    let repeat = gif_repeat(original);
    let decoder = GifDecoder::new(Cursor::new(original)).map_err(|e| e.to_string())?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| e.to_string())?;

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        if let Some(repeat) = repeat {
            encoder.set_repeat(repeat).map_err(|e| e.to_string())?;
        }
        encoder.encode_frames(frames).map_err(|e| e.to_string())?;
    }
    Ok(out)
}

/// Loop setting from the NETSCAPE2.0 application extension, if present.
///
/// A loop count of zero means forever. Without the extension the animation
/// plays once.
pub fn gif_repeat(bytes: &[u8]) -> Option<Repeat> {
    const APP_ID: &[u8] = b"NETSCAPE2.0";
    let start = bytes.windows(APP_ID.len()).position(|w| w == APP_ID)? + APP_ID.len();
    match bytes.get(start..start + 4)? {
        [3, 1, lo, hi] => match u16::from_le_bytes([*lo, *hi]) {
            0 => Some(Repeat::Infinite),
            n => Some(Repeat::Finite(n)),
        },
        _ => None,
    }
}
