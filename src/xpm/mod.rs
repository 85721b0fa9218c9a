//! Decoding and Encoding of XPM Images
//!
//! XPM (X PixMap) Format is a plain text image format, originally designed to store
//! cursor and icon data. XPM images are valid C code: an array of strings holding a
//! `<Values>` line, a color table, and one string per pixel row.
//!
//! ```text
//! /* XPM */
//! static char * name[] = {
//! "<width> <height> <ncolors> <chars per pixel>",
//! "<code> c #RRGGBB",
//! "<row of width * chars per pixel code characters>",
//! };
//! ```
//!
//! The decoder is lenient about the C syntax around the strings: it only looks at the
//! contents of string literals (skipping `/* comments */`), one logical line per source
//! line. Within the strings it is strict: a malformed header, color line or pixel row
//! is an error.
//!
//! Only the color visual (`c`) is supported, and it must be the first definition of
//! each color line. Color values are either `None` (fully transparent) or `#RRGGBB`;
//! other values, such as X11 color names, decode as black.
//!
//! The encoder writes one character per pixel by default, which allows 80 colors.
//! Images with more colors are reduced to 80 with Floyd-Steinberg dithering, unless
//! more characters per pixel are requested with [XpmEncoder::with_chars_per_pixel].
//!
//! Not supported:
//! - More than 8 characters per pixel (rejected with an error; codes are
//!   stored packed in a `u64`)
//! - XPMEXT extensions
//! - Color names, HSV color specifications
//! - Output for non-color visuals (`m`, `s`, `g4`, `g`)
//!
//! # Related Links
//! * <https://www.x.org/docs/XPM/xpm.pdf> - XPM Manual version 3.4i, which specifies the format
//! * <https://en.wikipedia.org/wiki/X_PixMap> - The XPM format on wikipedia

mod lexer;
mod palette;
mod parse;
mod quantize;
mod symbols;
mod writer;

use std::fmt;
use std::io::{Read, Write};

use image::error::{
    DecodingError, EncodingError, ImageError, ImageFormatHint, ImageResult, ParameterError,
    ParameterErrorKind,
};
use image::{
    ColorType, DynamicImage, ExtendedColorType, GrayAlphaImage, GrayImage, ImageDecoder,
    ImageEncoder, LimitSupport, Limits, RgbImage, RgbaImage,
};
use log::{debug, warn};

use lexer::{Lexer, SourceLine};
use palette::Palette;
use parse::{XpmHeaderInfo, COLOR_ENTRY_SIZE};
use symbols::SymbolTable;

pub use writer::{sanitize_name, DEFAULT_NAME};

/// Largest number of characters per pixel the encoder will write
const MAX_ENCODER_CHARS_PER_PIXEL: u32 = 4;

/// Section of the XPM file being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XpmPart {
    Colors,
    Pixels,
}

/// Field of the `<Values>` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderField {
    /// Fewer than four fields
    Count,
    Width,
    Height,
    Colors,
    CharsPerPixel,
}

/// Errors which can occur while parsing an XPM file. Line numbers refer to
/// the input text, rows to the image.
#[derive(Debug)]
enum XpmDecodeError {
    EmptyInput,
    InvalidHeader(HeaderField, u64),
    BadCharsPerPixel(u32),
    MissingLine(XpmPart),
    InvalidColorLine(u64),
    DuplicateColorKey(u64),
    UnknownColorKey(u32),
    ShortRow(u32),
    InsufficientData,
}

/// Errors which can occur while writing an XPM file
#[derive(Debug)]
enum XpmEncodeError {
    PaletteOverflow { colors: usize, budget: usize },
    UnsupportedColorType(ExtendedColorType),
}

impl fmt::Display for XpmPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Colors => f.write_str("<Colors> section"),
            Self::Pixels => f.write_str("<Pixels> section"),
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => f.write_str("expected 4 values"),
            Self::Width => f.write_str("bad width"),
            Self::Height => f.write_str("bad height"),
            Self::Colors => f.write_str("bad number of colors"),
            Self::CharsPerPixel => f.write_str("bad number of characters per pixel"),
        }
    }
}

impl fmt::Display for XpmDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => f.write_str("Empty data, no strings found"),
            Self::InvalidHeader(field, line) => f.write_fmt(format_args!(
                "Invalid <Values> header at line {}: {}",
                line, field
            )),
            Self::BadCharsPerPixel(c) => f.write_fmt(format_args!(
                "Invalid number of characters per pixel: {} is not in [1,8]",
                c
            )),
            Self::MissingLine(part) => {
                f.write_fmt(format_args!("Unexpected end of data in {}", part))
            }
            Self::InvalidColorLine(line) => f.write_fmt(format_args!(
                "Invalid color line at line {}: expected a code followed by \"c <color>\"",
                line
            )),
            Self::DuplicateColorKey(line) => {
                f.write_fmt(format_args!("Duplicate color code at line {}", line))
            }
            Self::UnknownColorKey(row) => {
                f.write_fmt(format_args!("Unknown color code in pixel row {}", row))
            }
            Self::ShortRow(row) => f.write_fmt(format_args!("Pixel row {} is too short", row)),
            Self::InsufficientData => {
                f.write_str("Image dimensions exceed the amount of data in the file")
            }
        }
    }
}

impl fmt::Display for XpmEncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PaletteOverflow { colors, budget } => f.write_fmt(format_args!(
                "Palette of {} colors exceeds the {} available color codes",
                colors, budget
            )),
            Self::UnsupportedColorType(color) => {
                f.write_fmt(format_args!("Unsupported color type {:?}", color))
            }
        }
    }
}

impl std::error::Error for XpmDecodeError {}

impl std::error::Error for XpmEncodeError {}

fn format_hint() -> ImageFormatHint {
    ImageFormatHint::Name("XPM".into())
}

impl From<XpmDecodeError> for ImageError {
    fn from(e: XpmDecodeError) -> ImageError {
        ImageError::Decoding(DecodingError::new(format_hint(), e))
    }
}

impl From<XpmEncodeError> for ImageError {
    fn from(e: XpmEncodeError) -> ImageError {
        ImageError::Encoding(EncodingError::new(format_hint(), e))
    }
}

/// XPM decoder
///
/// The whole file is read into memory by [XpmDecoder::new]; only the header is
/// interpreted until the image is read.
pub struct XpmDecoder {
    lines: Vec<SourceLine>,
    info: XpmHeaderInfo,
}

impl XpmDecoder {
    /// Create a new [XpmDecoder].
    pub fn new<R: Read>(mut reader: R) -> Result<XpmDecoder, ImageError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        let lines = lexer::tokenize(&data);
        let info = parse::parse_header(&lines)?;

        // Every pixel takes `cpp` bytes of input, so a header claiming more pixels
        // than that is broken; reject it before the output buffer gets allocated.
        let min_len = u64::from(info.width)
            .checked_mul(u64::from(info.height))
            .and_then(|x| x.checked_mul(u64::from(info.cpp)));
        if min_len.is_none_or(|n| n > data.len() as u64) {
            return Err(XpmDecodeError::InsufficientData.into());
        }

        Ok(XpmDecoder { lines, info })
    }
}

impl ImageDecoder for XpmDecoder {
    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }
    fn color_type(&self) -> ColorType {
        ColorType::Rgba8
    }
    fn read_image(self, buf: &mut [u8]) -> ImageResult<()>
    where
        Self: Sized,
    {
        assert_eq!(u64::try_from(buf.len()), Ok(self.total_bytes()));

        let palette = parse::parse_color_table(&self.lines, &self.info)?;
        debug!("Read XPM color table with {} entries", palette.len());
        parse::parse_pixels(&self.lines, &self.info, &palette, buf)?;

        Ok(())
    }
    fn read_image_boxed(self: Box<Self>, buf: &mut [u8]) -> ImageResult<()> {
        (*self).read_image(buf)
    }

    fn set_limits(&mut self, mut limits: Limits) -> ImageResult<()> {
        limits.check_support(&LimitSupport::default())?;
        let (width, height) = self.dimensions();
        limits.check_dimensions(width, height)?;

        // The output buffer and the sorted color table are alive together
        limits.reserve(self.total_bytes())?;
        let table_bytes = u64::from(self.info.ncolors).saturating_mul(COLOR_ENTRY_SIZE as u64);
        limits.reserve(table_bytes)?;
        Ok(())
    }
}

/// Encoder for XPM images.
pub struct XpmEncoder<W> {
    writer: W,
    name: String,
    cpp: u32,
    transparency: bool,
}

impl<W: Write> XpmEncoder<W> {
    /// Create a new encoder writing an image named [DEFAULT_NAME] with one
    /// character per pixel.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            name: DEFAULT_NAME.to_string(),
            cpp: 1,
            transparency: false,
        }
    }

    /// Set the name of the C array. It is passed through [sanitize_name].
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = sanitize_name(name);
        self
    }

    /// Set the number of characters per pixel, from 1 to 4. Each step multiplies the
    /// number of colors that can be written without quantization by 80.
    pub fn with_chars_per_pixel(mut self, cpp: u32) -> Self {
        self.cpp = cpp;
        self
    }

    /// Write fully transparent pixels as the `None` color, so that they decode as
    /// transparent. Otherwise (the default) the alpha channel is dropped.
    pub fn with_transparency(mut self, transparency: bool) -> Self {
        self.transparency = transparency;
        self
    }

    /// Encode `image`, reducing its colors first if they do not fit the available
    /// color codes.
    pub fn encode_image(mut self, image: &RgbaImage) -> ImageResult<()> {
        if !(1..=MAX_ENCODER_CHARS_PER_PIXEL).contains(&self.cpp) {
            return Err(ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::Generic(format!(
                    "XPM characters per pixel must be in [1,{}], got {}",
                    MAX_ENCODER_CHARS_PER_PIXEL, self.cpp
                )),
            )));
        }

        let budget = symbols::budget(self.cpp);
        let mut palette = Palette::build(image, self.transparency);

        let quantized;
        let image = if palette.len() > budget {
            warn!(
                "Image has {} colors, more than the {} XPM color codes; quantizing",
                palette.len(),
                budget
            );
            quantized = quantize::reduce(image, budget);
            palette = Palette::build(&quantized, self.transparency);
            &quantized
        } else {
            image
        };

        let symbols = SymbolTable::assign(palette.len(), self.cpp)?;
        debug!(
            "Writing {}x{} XPM image \"{}\" with {} colors",
            image.width(),
            image.height(),
            self.name,
            palette.len()
        );

        writer::write_xpm(
            &mut self.writer,
            &self.name,
            image.dimensions(),
            &palette,
            &symbols,
        )?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> ImageEncoder for XpmEncoder<W> {
    fn write_image(
        self,
        buf: &[u8],
        width: u32,
        height: u32,
        color_type: ExtendedColorType,
    ) -> ImageResult<()> {
        let channels = match color_type {
            ExtendedColorType::L8 => 1,
            ExtendedColorType::La8 => 2,
            ExtendedColorType::Rgb8 => 3,
            ExtendedColorType::Rgba8 => 4,
            _ => return Err(XpmEncodeError::UnsupportedColorType(color_type).into()),
        };
        let expected = u64::from(width) * u64::from(height) * channels;
        if buf.len() as u64 != expected {
            return Err(ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::DimensionMismatch,
            )));
        }

        let buf = buf.to_vec();
        let image = match color_type {
            ExtendedColorType::L8 => GrayImage::from_raw(width, height, buf).map(DynamicImage::from),
            ExtendedColorType::La8 => {
                GrayAlphaImage::from_raw(width, height, buf).map(DynamicImage::from)
            }
            ExtendedColorType::Rgb8 => RgbImage::from_raw(width, height, buf).map(DynamicImage::from),
            _ => RgbaImage::from_raw(width, height, buf).map(DynamicImage::from),
        };
        let image = image.ok_or(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )))?;

        self.encode_image(&image.into_rgba8())
    }
}

/// Read only the width and height of an XPM image.
pub fn decode_dimensions(data: &[u8]) -> ImageResult<(u32, u32)> {
    let first: Vec<SourceLine> = Lexer::new(data).take(1).collect();
    let info = parse::parse_header(&first)?;
    Ok((info.width, info.height))
}

/// Decode a complete XPM image.
pub fn decode(data: &[u8]) -> ImageResult<RgbaImage> {
    let decoder = XpmDecoder::new(data)?;
    Ok(DynamicImage::from_decoder(decoder)?.into_rgba8())
}

/// Encode `image` as an XPM file with the given array name.
pub fn encode(image: &RgbaImage, name: &str) -> ImageResult<Vec<u8>> {
    let mut out = Vec::new();
    XpmEncoder::new(&mut out)
        .with_name(name)
        .encode_image(image)?;
    Ok(out)
}
