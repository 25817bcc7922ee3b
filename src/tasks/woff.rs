// src/tasks/woff.rs

//! TrueType/OpenType → WOFF 1.0 and WOFF 2.0 wrapping.
//!
//! Both encoders keep every sfnt table byte-for-byte. WOFF 1.0 compresses
//! each table with zlib; WOFF 2.0 compresses the concatenated tables as a
//! single Brotli stream and uses the null transform for every table, which
//! the format allows for `glyf`/`loca` as well.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use thiserror::Error;
use tracing::debug;

use crate::errors::{TaskError, TaskResult};
use crate::fs;
use crate::project::Project;
use crate::tasks::{TaskName, TaskReport};

const SFNT_HEADER_LEN: usize = 12;
const SFNT_RECORD_LEN: usize = 16;
const WOFF_HEADER_LEN: usize = 44;
const WOFF_RECORD_LEN: usize = 20;
const WOFF2_HEADER_LEN: usize = 48;

const WOFF_SIGNATURE: &[u8; 4] = b"wOFF";
const WOFF2_SIGNATURE: &[u8; 4] = b"wOF2";

const FLAVOR_TRUETYPE: u32 = 0x0001_0000;
const FLAVOR_APPLE_TRUE: u32 = u32::from_be_bytes(*b"true");
const FLAVOR_CFF: u32 = u32::from_be_bytes(*b"OTTO");

/// Tag index table of the WOFF 2.0 table directory; index 63 means an
/// explicit tag follows.
const WOFF2_KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

/// WOFF2 transform version 3: null transform for `glyf`/`loca`.
const WOFF2_NULL_TRANSFORM_GLYF: u8 = 3 << 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FontError {
    #[error("truncated font: {0}")]
    Truncated(&'static str),

    #[error("unsupported sfnt flavor 0x{0:08x}")]
    UnsupportedFlavor(u32),

    #[error("font has no tables")]
    NoTables,

    #[error("table '{tag}' lies outside the file")]
    TableOutOfBounds { tag: String },

    #[error("compression failed: {0}")]
    Compression(String),
}

/// Output container for [`convert_fonts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    Woff,
    Woff2,
}

impl FontFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FontFormat::Woff => "woff",
            FontFormat::Woff2 => "woff2",
        }
    }
}

/// A parsed sfnt: flavor plus tables sorted by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sfnt {
    pub flavor: u32,
    pub tables: Vec<SfntTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfntTable {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub data: Vec<u8>,
}

/// Convert every `<src>/fonts/**/*.ttf` into `<dist>/fonts/<name>.<ext>`.
pub fn convert_fonts(project: &Project, format: FontFormat) -> TaskResult<TaskReport> {
    let task = match format {
        FontFormat::Woff => TaskName::Ttf2Woff,
        FontFormat::Woff2 => TaskName::Ttf2Woff2,
    };
    let from = project.source_path("fonts");
    let to = project.output_path("fonts");
    let mut report = TaskReport::new(task);

    for file in fs::collect_files_with_extension(&from, "ttf", true)? {
        let bytes = fs::read(&file)?;
        let font_err = |source| TaskError::Font {
            path: file.clone(),
            source,
        };
        let sfnt = parse_sfnt(&bytes).map_err(font_err)?;
        let encoded = match format {
            FontFormat::Woff => encode_woff(&sfnt),
            FontFormat::Woff2 => encode_woff2(&sfnt),
        }
        .map_err(font_err)?;

        let rel = file
            .strip_prefix(&from)
            .map_err(|e| TaskError::malformed(&file, e))?;
        let target = to.join(rel).with_extension(format.extension());
        fs::write(&target, &encoded)?;
        debug!(font = ?file, before = bytes.len(), after = encoded.len(), "converted font");
        report.push(target);
    }

    Ok(report)
}

/// Parse the sfnt offset table and copy out every table.
pub fn parse_sfnt(bytes: &[u8]) -> Result<Sfnt, FontError> {
    let flavor = read_u32(bytes, 0).ok_or(FontError::Truncated("offset table"))?;
    if !matches!(flavor, FLAVOR_TRUETYPE | FLAVOR_APPLE_TRUE | FLAVOR_CFF) {
        return Err(FontError::UnsupportedFlavor(flavor));
    }
    let num_tables = read_u16(bytes, 4).ok_or(FontError::Truncated("offset table"))? as usize;
    if num_tables == 0 {
        return Err(FontError::NoTables);
    }

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let rec = SFNT_HEADER_LEN + i * SFNT_RECORD_LEN;
        let record = bytes
            .get(rec..rec + SFNT_RECORD_LEN)
            .ok_or(FontError::Truncated("table directory"))?;
        let tag = [record[0], record[1], record[2], record[3]];
        let checksum = read_u32(record, 4).ok_or(FontError::Truncated("table directory"))?;
        let offset = read_u32(record, 8).ok_or(FontError::Truncated("table directory"))? as usize;
        let length = read_u32(record, 12).ok_or(FontError::Truncated("table directory"))? as usize;

        let data = offset
            .checked_add(length)
            .and_then(|end| bytes.get(offset..end))
            .ok_or_else(|| FontError::TableOutOfBounds {
                tag: String::from_utf8_lossy(&tag).into_owned(),
            })?;
        tables.push(SfntTable {
            tag,
            checksum,
            data: data.to_vec(),
        });
    }

    tables.sort_by(|a, b| a.tag.cmp(&b.tag));
    Ok(Sfnt { flavor, tables })
}

/// Size of the sfnt the tables would rebuild into.
fn total_sfnt_size(sfnt: &Sfnt) -> u32 {
    let tables: usize = sfnt.tables.iter().map(|t| pad4(t.data.len())).sum();
    (SFNT_HEADER_LEN + SFNT_RECORD_LEN * sfnt.tables.len() + tables) as u32
}

/// `head.fontRevision` split into (major, minor), or zeros.
fn font_version(sfnt: &Sfnt) -> (u16, u16) {
    sfnt.tables
        .iter()
        .find(|t| &t.tag == b"head")
        .and_then(|t| Some((read_u16(&t.data, 4)?, read_u16(&t.data, 6)?)))
        .unwrap_or((0, 0))
}

/// Encode as WOFF 1.0.
pub fn encode_woff(sfnt: &Sfnt) -> Result<Vec<u8>, FontError> {
    let num_tables = sfnt.tables.len();
    if num_tables == 0 {
        return Err(FontError::NoTables);
    }

    let mut directory = Vec::with_capacity(num_tables * WOFF_RECORD_LEN);
    let mut data = Vec::new();
    let data_start = WOFF_HEADER_LEN + num_tables * WOFF_RECORD_LEN;

    for table in &sfnt.tables {
        let compressed = zlib(&table.data)?;
        let stored: &[u8] = if compressed.len() < table.data.len() {
            &compressed
        } else {
            &table.data
        };

        let offset = data_start + data.len();
        directory.extend_from_slice(&table.tag);
        directory.extend_from_slice(&(offset as u32).to_be_bytes());
        directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        directory.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        directory.extend_from_slice(&table.checksum.to_be_bytes());

        data.extend_from_slice(stored);
        data.resize(pad4(data.len()), 0);
    }

    let length = data_start + data.len();
    let (major, minor) = font_version(sfnt);

    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(WOFF_SIGNATURE);
    out.extend_from_slice(&sfnt.flavor.to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&(num_tables as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&total_sfnt_size(sfnt).to_be_bytes());
    out.extend_from_slice(&major.to_be_bytes());
    out.extend_from_slice(&minor.to_be_bytes());
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data);

    debug_assert_eq!(out.len(), length);
    Ok(out)
}

/// Encode as WOFF 2.0.
pub fn encode_woff2(sfnt: &Sfnt) -> Result<Vec<u8>, FontError> {
    if sfnt.tables.is_empty() {
        return Err(FontError::NoTables);
    }

    let ordered = woff2_table_order(sfnt);

    let mut directory = Vec::new();
    let mut stream = Vec::new();
    for table in &ordered {
        let known = WOFF2_KNOWN_TAGS.iter().position(|t| **t == table.tag);
        let mut flags = known.map(|i| i as u8).unwrap_or(63);
        if &table.tag == b"glyf" || &table.tag == b"loca" {
            flags |= WOFF2_NULL_TRANSFORM_GLYF;
        }
        directory.push(flags);
        if known.is_none() {
            directory.extend_from_slice(&table.tag);
        }
        write_uint_base128(&mut directory, table.data.len() as u32);
        stream.extend_from_slice(&table.data);
    }

    let compressed = brotli_compress(&stream)?;
    let compressed_end = WOFF2_HEADER_LEN + directory.len() + compressed.len();
    let length = pad4(compressed_end);
    let (major, minor) = font_version(sfnt);

    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(WOFF2_SIGNATURE);
    out.extend_from_slice(&sfnt.flavor.to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&(ordered.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&total_sfnt_size(sfnt).to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&major.to_be_bytes());
    out.extend_from_slice(&minor.to_be_bytes());
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out.resize(length, 0);
    Ok(out)
}

/// Tag order, except that `loca` directly follows `glyf`.
fn woff2_table_order(sfnt: &Sfnt) -> Vec<&SfntTable> {
    let mut ordered: Vec<&SfntTable> = sfnt.tables.iter().filter(|t| &t.tag != b"loca").collect();
    if let Some(loca) = sfnt.tables.iter().find(|t| &t.tag == b"loca") {
        match ordered.iter().position(|t| &t.tag == b"glyf") {
            Some(glyf) => ordered.insert(glyf + 1, loca),
            None => ordered.push(loca),
        }
    }
    ordered
}

/// WOFF2 `UIntBase128`: big-endian 7-bit groups, high bit marks
/// continuation, no leading zero groups.
pub fn write_uint_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    let mut v = value;
    loop {
        groups[n] = (v & 0x7f) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
}

fn zlib(data: &[u8]) -> Result<Vec<u8>, FontError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(data)
        .map_err(|e| FontError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| FontError::Compression(e.to_string()))
}

fn brotli_compress(data: &[u8]) -> Result<Vec<u8>, FontError> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 11, 22);
    writer
        .write_all(data)
        .map_err(|e| FontError::Compression(e.to_string()))?;
    Ok(writer.into_inner())
}

fn pad4(n: usize) -> usize {
    (n + 3) & !3
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let b = bytes.get(at..at + 2)?;
    Some(u16::from_be_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}
