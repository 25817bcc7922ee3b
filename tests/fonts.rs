use std::error::Error;
use std::fs;
use std::io::Read;

use assetpipe::errors::TaskError;
use assetpipe::tasks::copy::stage_fonts;
use assetpipe::tasks::woff::{
    FontError, FontFormat, convert_fonts, encode_woff, encode_woff2, parse_sfnt,
    write_uint_base128,
};
use assetpipe_test_utils::builders::{ProjectFixture, ttf_bytes};
use assetpipe_test_utils::init_tracing;
use flate2::read::ZlibDecoder;

type TestResult = Result<(), Box<dyn Error>>;

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[test]
fn sfnt_tables_are_read_in_tag_order() -> TestResult {
    let sfnt = parse_sfnt(&ttf_bytes())?;

    let tags: Vec<&[u8]> = sfnt.tables.iter().map(|t| &t.tag[..]).collect();
    assert_eq!(tags, vec![&b"glyf"[..], b"head", b"loca", b"zzzz"]);
    assert_eq!(sfnt.flavor, 0x0001_0000);
    Ok(())
}

#[test]
fn truncated_fonts_are_rejected() {
    let bytes = ttf_bytes();

    assert_eq!(parse_sfnt(&bytes[..3]), Err(FontError::Truncated("offset table")));
    assert_eq!(parse_sfnt(&bytes[..20]), Err(FontError::Truncated("table directory")));
    assert!(matches!(
        parse_sfnt(&bytes[..bytes.len() - 40]),
        Err(FontError::TableOutOfBounds { .. })
    ));
    assert_eq!(
        parse_sfnt(b"wOFFxxxxxxxxxxxx"),
        Err(FontError::UnsupportedFlavor(u32::from_be_bytes(*b"wOFF")))
    );
}

#[test]
fn woff_wraps_every_table_losslessly() -> TestResult {
    let sfnt = parse_sfnt(&ttf_bytes())?;
    let woff = encode_woff(&sfnt)?;

    assert_eq!(&woff[0..4], b"wOFF");
    assert_eq!(u32_at(&woff, 4), 0x0001_0000);
    assert_eq!(u32_at(&woff, 8) as usize, woff.len());
    assert_eq!(u16_at(&woff, 12), 4);
    // head.fontRevision 2.5
    assert_eq!((u16_at(&woff, 20), u16_at(&woff, 22)), (2, 5));
    assert_eq!(woff.len() % 4, 0);

    for (i, table) in sfnt.tables.iter().enumerate() {
        let rec = 44 + i * 20;
        assert_eq!(&woff[rec..rec + 4], &table.tag);
        let offset = u32_at(&woff, rec + 4) as usize;
        let comp_len = u32_at(&woff, rec + 8) as usize;
        let orig_len = u32_at(&woff, rec + 12) as usize;
        assert_eq!(u32_at(&woff, rec + 16), table.checksum);
        assert_eq!(offset % 4, 0);
        assert_eq!(orig_len, table.data.len());

        let stored = &woff[offset..offset + comp_len];
        let data = if comp_len < orig_len {
            let mut out = Vec::new();
            ZlibDecoder::new(stored).read_to_end(&mut out)?;
            out
        } else {
            stored.to_vec()
        };
        assert_eq!(data, table.data);
    }
    Ok(())
}

#[test]
fn woff_compresses_repetitive_tables() -> TestResult {
    let sfnt = parse_sfnt(&ttf_bytes())?;
    let woff = encode_woff(&sfnt)?;

    // glyf is 120 identical bytes and sorts first.
    assert_eq!(&woff[44..48], b"glyf");
    assert!(u32_at(&woff, 44 + 8) < 120);
    Ok(())
}

#[test]
fn woff2_uses_known_tags_and_one_brotli_stream() -> TestResult {
    let sfnt = parse_sfnt(&ttf_bytes())?;
    let woff2 = encode_woff2(&sfnt)?;

    assert_eq!(&woff2[0..4], b"wOF2");
    assert_eq!(u32_at(&woff2, 8) as usize, woff2.len());
    assert_eq!(u16_at(&woff2, 12), 4);
    assert_eq!(woff2.len() % 4, 0);

    // glyf, loca (null transform), head, then an explicit tag.
    let mut directory = vec![0xCA, 120, 0xCB, 6, 0x01, 54, 0x3F];
    directory.extend_from_slice(b"zzzz");
    directory.push(13);
    assert_eq!(&woff2[48..48 + directory.len()], &directory[..]);

    let compressed_len = u32_at(&woff2, 20) as usize;
    let start = 48 + directory.len();
    let mut stream = Vec::new();
    brotli::Decompressor::new(&woff2[start..start + compressed_len], 4096)
        .read_to_end(&mut stream)?;

    let table = |tag: &[u8; 4]| sfnt.tables.iter().find(|t| &t.tag == tag).unwrap().data.clone();
    let expected = [table(b"glyf"), table(b"loca"), table(b"head"), table(b"zzzz")].concat();
    assert_eq!(stream, expected);
    Ok(())
}

#[test]
fn uint_base128_encoding() {
    let encode = |v| {
        let mut out = Vec::new();
        write_uint_base128(&mut out, v);
        out
    };

    assert_eq!(encode(0), vec![0x00]);
    assert_eq!(encode(127), vec![0x7f]);
    assert_eq!(encode(128), vec![0x81, 0x00]);
    assert_eq!(encode(16_384), vec![0x81, 0x80, 0x00]);
    assert_eq!(encode(u32::MAX), vec![0x8f, 0xff, 0xff, 0xff, 0x7f]);
}

#[test]
fn conversion_tasks_write_next_to_each_other() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new()
        .source("fonts/Body.ttf", ttf_bytes())
        .source("fonts/sub/Head.ttf", ttf_bytes())
        .source("fonts/readme.txt", "skip me");
    let project = fixture.project();

    convert_fonts(&project, FontFormat::Woff)?;
    convert_fonts(&project, FontFormat::Woff2)?;

    assert_eq!(
        fixture.output_files(),
        vec![
            "fonts/Body.woff",
            "fonts/Body.woff2",
            "fonts/sub/Head.woff",
            "fonts/sub/Head.woff2",
        ]
    );
    Ok(())
}

#[test]
fn malformed_ttf_fails_conversion() {
    let fixture = ProjectFixture::new().source("fonts/bad.ttf", b"\x00\x01\x00\x00\x00");

    let err = convert_fonts(&fixture.project(), FontFormat::Woff).unwrap_err();

    assert!(matches!(err, TaskError::Font { .. }), "{err:?}");
}

#[test]
fn fonts_are_staged_verbatim() -> TestResult {
    let fixture = ProjectFixture::new()
        .source("fonts/a.woff2", b"\x01\x02")
        .source("fonts/sub/b.ttf", ttf_bytes());

    stage_fonts(&fixture.project())?;

    assert_eq!(fs::read(fixture.output("fonts/a.woff2"))?, b"\x01\x02");
    assert_eq!(fs::read(fixture.output("fonts/sub/b.ttf"))?, ttf_bytes());
    Ok(())
}
