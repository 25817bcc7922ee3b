use std::error::Error;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use assetpipe::config::ImagesSection;
use assetpipe::errors::TaskError;
use assetpipe::tasks::images::{ImageFormat, gif_repeat, optimize_image, optimize_images};
use assetpipe::tasks::svg::{minify_svg, parse_viewbox, split_root};
use assetpipe_test_utils::builders::{ProjectFixture, icon_svg, jpeg_bytes, png_bytes};
use assetpipe_test_utils::init_tracing;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame, Rgba, RgbaImage};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn formats_are_detected_by_extension() {
    assert_eq!(ImageFormat::from_path(Path::new("a/b.JPG")), ImageFormat::Jpeg);
    assert_eq!(ImageFormat::from_path(Path::new("b.jpeg")), ImageFormat::Jpeg);
    assert_eq!(ImageFormat::from_path(Path::new("c.png")), ImageFormat::Png);
    assert_eq!(ImageFormat::from_path(Path::new("d.gif")), ImageFormat::Gif);
    assert_eq!(ImageFormat::from_path(Path::new("e.svg")), ImageFormat::Svg);
    assert_eq!(ImageFormat::from_path(Path::new("f.webp")), ImageFormat::Other);
    assert_eq!(ImageFormat::from_path(Path::new("noext")), ImageFormat::Other);
}

#[test]
fn unknown_formats_pass_through() -> TestResult {
    let bytes = b"\x00\x01binary".to_vec();

    let out = optimize_image(Path::new("x.webp"), &bytes, &ImagesSection::default())?;

    assert_eq!(out, bytes);
    Ok(())
}

#[test]
fn jpeg_is_reencoded_smaller() -> TestResult {
    let original = jpeg_bytes(64, 64);

    let out = optimize_image(Path::new("photo.jpg"), &original, &ImagesSection::default())?;

    assert!(out.len() < original.len());
    let decoded = image::load_from_memory(&out)?;
    assert_eq!((decoded.width(), decoded.height()), (64, 64));
    Ok(())
}

fn has_marker(jpeg: &[u8], marker: u8) -> bool {
    jpeg.windows(2).any(|w| w == [0xFF, marker])
}

#[test]
fn jpeg_is_reencoded_progressive() -> TestResult {
    let original = jpeg_bytes(64, 64);
    assert!(has_marker(&original, 0xC0));

    let out = optimize_image(Path::new("photo.jpg"), &original, &ImagesSection::default())?;

    assert!(has_marker(&out, 0xC2), "expected a progressive frame header");
    assert!(!has_marker(&out, 0xC0));
    Ok(())
}

#[test]
fn png_stays_lossless() -> TestResult {
    let original = png_bytes(32, 32);

    let out = optimize_image(Path::new("p.png"), &original, &ImagesSection::default())?;

    assert!(out.len() <= original.len());
    let before = image::load_from_memory(&original)?.to_rgba8();
    let after = image::load_from_memory(&out)?.to_rgba8();
    assert_eq!(before, after);
    Ok(())
}

/// Two-frame GIF padded with a comment block, so re-encoding always shrinks
/// it and the re-encoded bytes are what comes back.
fn padded_gif(repeat: Option<Repeat>) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut encoded = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut encoded);
        if let Some(repeat) = repeat {
            encoder.set_repeat(repeat)?;
        }
        for shade in [0u8, 255] {
            let img = RgbaImage::from_pixel(8, 8, Rgba([shade, 0, 0, 255]));
            encoder.encode_frame(Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(100, 1)))?;
        }
    }

    let trailer = encoded.pop();
    assert_eq!(trailer, Some(0x3B));
    encoded.extend_from_slice(&[0x21, 0xFE]);
    for _ in 0..4 {
        encoded.push(255);
        encoded.extend(std::iter::repeat_n(b'x', 255));
    }
    encoded.extend_from_slice(&[0x00, 0x3B]);
    Ok(encoded)
}

#[test]
fn gif_frames_and_looping_survive() -> TestResult {
    let original = padded_gif(Some(Repeat::Infinite))?;

    let out = optimize_image(Path::new("anim.gif"), &original, &ImagesSection::default())?;

    assert!(out.len() < original.len());
    assert!(matches!(gif_repeat(&out), Some(Repeat::Infinite)));
    let frames = GifDecoder::new(Cursor::new(out))?.into_frames().collect_frames()?;
    assert_eq!(frames.len(), 2);
    Ok(())
}

#[test]
fn gif_that_plays_once_does_not_start_looping() -> TestResult {
    let original = padded_gif(None)?;
    assert!(gif_repeat(&original).is_none());

    let out = optimize_image(Path::new("once.gif"), &original, &ImagesSection::default())?;

    assert!(out.len() < original.len());
    assert!(gif_repeat(&out).is_none());
    assert!(!out.windows(11).any(|w| w == b"NETSCAPE2.0"));
    Ok(())
}

#[test]
fn gif_finite_loop_count_is_kept() -> TestResult {
    let original = padded_gif(Some(Repeat::Finite(3)))?;

    let out = optimize_image(Path::new("thrice.gif"), &original, &ImagesSection::default())?;

    assert!(out.len() < original.len());
    assert!(matches!(gif_repeat(&out), Some(Repeat::Finite(3))));
    Ok(())
}

#[test]
fn undecodable_images_fail() {
    let err = optimize_image(Path::new("broken.png"), b"not a png", &ImagesSection::default())
        .unwrap_err();

    assert!(matches!(err, TaskError::Malformed { .. }), "{err:?}");
}

#[test]
fn optimizer_mirrors_the_images_tree() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new()
        .source("images/a.png", png_bytes(8, 8))
        .source("images/deep/b.jpg", jpeg_bytes(16, 16))
        .source("images/deep/c.txt", "notes")
        .source("images/icons/i.svg", icon_svg("M0 0"));

    optimize_images(&fixture.project())?;

    assert_eq!(
        fixture.output_files(),
        vec!["images/a.png", "images/deep/b.jpg", "images/deep/c.txt", "images/icons/i.svg"]
    );
    assert_eq!(fs::read_to_string(fixture.output("images/deep/c.txt"))?, "notes");
    Ok(())
}

#[test]
fn svg_minify_strips_noise_and_redundant_viewbox() -> TestResult {
    let out = minify_svg(&icon_svg("M0 0h24"), true)?;

    assert_eq!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24"><path d="M0 0h24"/></svg>"#
    );
    Ok(())
}

#[test]
fn svg_minify_keeps_meaningful_viewbox_and_ids() -> TestResult {
    let source = r#"<svg width="24" height="24" viewBox="0 0 48 48"><g id="layer"><circle r="4"/></g></svg>"#;

    let out = minify_svg(source, true)?;

    assert!(out.contains(r#"viewBox="0 0 48 48""#));
    assert!(out.contains(r#"id="layer""#));
    Ok(())
}

#[test]
fn svg_minify_can_keep_every_viewbox() -> TestResult {
    let out = minify_svg(&icon_svg("M0 0"), false)?;

    assert!(out.contains(r#"viewBox="0 0 24 24""#));
    Ok(())
}

#[test]
fn svg_minify_rejects_documents_without_a_root() {
    assert!(minify_svg("<!-- only a comment -->", true).is_err());
    assert!(minify_svg("<svg><g></svg>", true).is_err());
}

#[test]
fn split_root_separates_attributes_from_content() -> TestResult {
    let parts = split_root(&icon_svg("M5 5"))?;

    assert!(parts.root_attributes.iter().any(|(k, v)| k == "viewBox" && v == "0 0 24 24"));
    assert_eq!(parts.inner, r#"<path d="M5 5"/>"#);
    Ok(())
}

#[test]
fn viewbox_parsing_accepts_commas() {
    assert_eq!(parse_viewbox("0,0, 10 20"), Some([0.0, 0.0, 10.0, 20.0]));
    assert_eq!(parse_viewbox("0 0 10"), None);
}
