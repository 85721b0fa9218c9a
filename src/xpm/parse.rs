//! Interpretation of the logical lines of an XPM file: the `<Values>` header
//! line, the `<Colors>` table and the `<Pixels>` rows.

use log::{debug, trace, warn};

use super::lexer::SourceLine;
use super::{HeaderField, XpmDecodeError, XpmPart};

/// Largest supported number of characters per pixel; color codes are packed into a u64
pub(super) const MAX_CHARS_PER_PIXEL: u32 = 8;

/// Key XPM file properties determined from the first line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct XpmHeaderInfo {
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) ncolors: u32,
    /// characters per pixel
    pub(super) cpp: u32,
}

/// XPM color table, as read from the `<Colors>` section.
pub(super) struct XpmPalette {
    /// Color code entries sorted by code, for binary search lookups. Small
    /// palettes fit in cache, and large ones are rare in practice.
    table: Vec<XpmColorCodeEntry>,
}

/// Bytes of memory used per color table entry
pub(super) const COLOR_ENTRY_SIZE: usize = size_of::<XpmColorCodeEntry>();

/// Pixel code and value read from the Colors section of an XPM file
#[derive(Debug, Clone, Copy)]
struct XpmColorCodeEntry {
    code: u64,
    /// channel order: R,G,B,A
    value: [u8; 4],
}

impl XpmPalette {
    pub(super) fn len(&self) -> usize {
        self.table.len()
    }

    fn lookup(&self, code: u64) -> Option<[u8; 4]> {
        self.table
            .binary_search_by(|entry| entry.code.cmp(&code))
            .ok()
            .map(|index| self.table[index].value)
    }
}

/// Pack a color code of at most 8 bytes into an integer
fn pack_code(code: &[u8]) -> u64 {
    let mut buf = [0_u8; 8];
    buf[..code.len()].copy_from_slice(code);
    u64::from_le_bytes(buf)
}

/// Parse a decimal header field. An optional leading `+` and leading zeros
/// are allowed; anything else that is not a digit, or a value past
/// `u32::MAX`, is rejected.
fn parse_u32(data: &[u8]) -> Option<u32> {
    let digits = data.strip_prefix(b"+").unwrap_or(data);
    if digits.is_empty() {
        return None;
    }
    let mut x: u32 = 0;
    for c in digits {
        if c.is_ascii_digit() {
            x = x.checked_mul(10)?.checked_add((*c - b'0') as u32)?;
        } else {
            return None;
        }
    }
    Some(x)
}

fn parse_hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

fn parse_hex2(hi: u8, lo: u8) -> Option<u8> {
    Some((parse_hex(hi)? << 4) | parse_hex(lo)?)
}

/// Parse a color value from the `c` context of a color line.
///
/// Only `None` and `#RRGGBB` are understood; any other value is treated as
/// opaque black.
pub(super) fn parse_color(data: &[u8]) -> [u8; 4] {
    if data.eq_ignore_ascii_case(b"none") {
        return [0, 0, 0, 0];
    }
    if let [b'#', r2, r1, g2, g1, b2, b1] = data {
        if let (Some(r), Some(g), Some(b)) = (
            parse_hex2(*r2, *r1),
            parse_hex2(*g2, *g1),
            parse_hex2(*b2, *b1),
        ) {
            return [r, g, b, 0xff];
        }
    }
    warn!(
        "Unsupported XPM color value \"{}\", using black",
        String::from_utf8_lossy(data)
    );
    [0, 0, 0, 0xff]
}

fn split_whitespace(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split(|b| b.is_ascii_whitespace())
        .filter(|word| !word.is_empty())
}

/// Parse the `<Values>` line: width, height, number of colors and characters per pixel.
/// Any further values (hotspot, XPMEXT marker) are ignored.
pub(super) fn parse_header(lines: &[SourceLine]) -> Result<XpmHeaderInfo, XpmDecodeError> {
    let Some(first) = lines.first() else {
        return Err(XpmDecodeError::EmptyInput);
    };

    let fields: Vec<&[u8]> = split_whitespace(&first.text).take(4).collect();
    if fields.len() < 4 {
        return Err(XpmDecodeError::InvalidHeader(HeaderField::Count, first.line));
    }

    let field = |index: usize, name: HeaderField| {
        parse_u32(fields[index]).ok_or(XpmDecodeError::InvalidHeader(name, first.line))
    };
    let info = XpmHeaderInfo {
        width: field(0, HeaderField::Width)?,
        height: field(1, HeaderField::Height)?,
        ncolors: field(2, HeaderField::Colors)?,
        cpp: field(3, HeaderField::CharsPerPixel)?,
    };

    if info.cpp == 0 || info.cpp > MAX_CHARS_PER_PIXEL {
        return Err(XpmDecodeError::BadCharsPerPixel(info.cpp));
    }

    debug!(
        "XPM header: {}x{}, {} colors, {} chars per pixel",
        info.width, info.height, info.ncolors, info.cpp
    );
    Ok(info)
}

/// Parse the `<Colors>` section, which follows the header line.
pub(super) fn parse_color_table(
    lines: &[SourceLine],
    info: &XpmHeaderInfo,
) -> Result<XpmPalette, XpmDecodeError> {
    let cpp = info.cpp as usize;

    // Do not reserve `ncolors` entries up front: the count comes from the file
    // and is not validated against the amount of data present.
    let mut table: Vec<XpmColorCodeEntry> = Vec::new();

    for i in 0..info.ncolors as usize {
        let Some(line) = lines.get(1 + i) else {
            return Err(XpmDecodeError::MissingLine(XpmPart::Colors));
        };
        if line.text.len() < cpp {
            return Err(XpmDecodeError::InvalidColorLine(line.line));
        }
        let (code, definition) = line.text.split_at(cpp);

        // Only the color visual is supported, and it must be the first context
        let mut words = split_whitespace(definition);
        let value = match (words.next(), words.next()) {
            (Some(b"c"), Some(value)) => parse_color(value),
            _ => return Err(XpmDecodeError::InvalidColorLine(line.line)),
        };
        trace!(
            "XPM color \"{}\" = {:?}",
            String::from_utf8_lossy(code),
            value
        );

        table.push(XpmColorCodeEntry {
            code: pack_code(code),
            value,
        });
    }

    // Sort table and check for duplicates. The stable sort keeps file order among
    // equal codes, so the second definition is the one reported.
    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by_key(|&i| table[i].code);
    for w in order.windows(2) {
        if table[w[0]].code == table[w[1]].code {
            return Err(XpmDecodeError::DuplicateColorKey(lines[1 + w[1]].line));
        }
    }
    let table = order.into_iter().map(|i| table[i]).collect();

    Ok(XpmPalette { table })
}

/// Parse the `<Pixels>` section into `buf`, which holds `width * height` RGBA8 pixels.
pub(super) fn parse_pixels(
    lines: &[SourceLine],
    info: &XpmHeaderInfo,
    palette: &XpmPalette,
    buf: &mut [u8],
) -> Result<(), XpmDecodeError> {
    let cpp = info.cpp as usize;
    let width = info.width as usize;
    let first_row = 1 + info.ncolors as usize;

    if width == 0 {
        return Ok(());
    }

    for (y, row) in buf.chunks_exact_mut(width * 4).enumerate() {
        let Some(line) = lines.get(first_row + y) else {
            return Err(XpmDecodeError::MissingLine(XpmPart::Pixels));
        };
        let Some(codes) = line.text.get(..width * cpp) else {
            return Err(XpmDecodeError::ShortRow(y as u32));
        };

        for (pixel, code) in row.chunks_exact_mut(4).zip(codes.chunks_exact(cpp)) {
            let value = palette
                .lookup(pack_code(code))
                .ok_or(XpmDecodeError::UnknownColorKey(y as u32))?;
            pixel.copy_from_slice(&value);
        }
    }

    Ok(())
}
