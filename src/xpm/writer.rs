//! Rendering of XPM source text.

use std::io::{self, Write};

use super::palette::Palette;
use super::symbols::SymbolTable;

/// Array name used when the requested one has no usable characters
pub const DEFAULT_NAME: &str = "image";

/// Turn `name` into a valid C identifier for the XPM array.
///
/// Surrounding whitespace is dropped. The first character must be an ASCII
/// letter and later ones ASCII letters or digits; anything else becomes `_`.
/// Falls back to [DEFAULT_NAME] if nothing usable is left.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut usable = false;

    for (i, c) in name.trim().chars().enumerate() {
        if c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()) {
            out.push(c);
            usable = true;
        } else {
            out.push('_');
        }
    }

    if usable {
        out
    } else {
        DEFAULT_NAME.to_string()
    }
}

/// Write a complete XPM file. `name` must already be sanitized, and `palette`
/// must have been built from a `width` by `height` image.
pub(super) fn write_xpm<W: Write>(
    w: &mut W,
    name: &str,
    (width, height): (u32, u32),
    palette: &Palette,
    symbols: &SymbolTable,
) -> io::Result<()> {
    let cpp = symbols.chars_per_pixel();

    writeln!(w, "/* XPM */")?;
    writeln!(w, "static char * {}[] = {{", name)?;
    writeln!(w, "\"{} {} {} {}\",", width, height, palette.len(), cpp)?;

    for (i, color) in palette.colors().iter().enumerate() {
        w.write_all(b"\"")?;
        w.write_all(symbols.code(i))?;
        if palette.is_transparent(i) {
            w.write_all(b" c None\",\n")?;
        } else {
            // No alpha channel in this color syntax
            writeln!(w, " c #{:02X}{:02X}{:02X}\",", color[0], color[1], color[2])?;
        }
    }

    let width = width as usize;
    let mut line = Vec::with_capacity(width * cpp + 3);
    for y in 0..height as usize {
        line.clear();
        line.push(b'"');
        for &index in &palette.indices()[y * width..(y + 1) * width] {
            line.extend_from_slice(symbols.code(index));
        }
        line.push(b'"');
        if y + 1 < height as usize {
            line.push(b',');
        }
        line.push(b'\n');
        w.write_all(&line)?;
    }

    writeln!(w, "}};")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_name("3D Model"), "_D_Model");
        assert_eq!(sanitize_name(""), "image");
        assert_eq!(sanitize_name("valid_name"), "valid_name");
        assert_eq!(sanitize_name("  cats  "), "cats");
        assert_eq!(sanitize_name("icon-16x16"), "icon_16x16");
        assert_eq!(sanitize_name("café"), "caf_");
        assert_eq!(sanitize_name("   "), "image");
        assert_eq!(sanitize_name("123"), "_23");
        assert_eq!(sanitize_name("!?!"), "image");
    }

    fn render(image: &RgbaImage, transparency: bool) -> String {
        let palette = Palette::build(image, transparency);
        let symbols = SymbolTable::assign(palette.len(), 1).unwrap();
        let mut out = Vec::new();
        write_xpm(&mut out, "test", image.dimensions(), &palette, &symbols).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn layout() {
        let image = RgbaImage::from_fn(3, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0x12, 0xab, 0xff, 255])
            } else {
                Rgba([0, 0, 0, 128])
            }
        });
        assert_eq!(
            render(&image, false),
            "/* XPM */
static char * test[] = {
\"3 2 2 1\",
\"  c #12ABFF\",
\". c #000000\",
\" . \",
\". .\"
};
"
        );
    }

    #[test]
    fn transparent_entry() {
        let image = RgbaImage::from_fn(2, 1, |x, _| {
            let alpha = if x == 0 { 255 } else { 0 };
            Rgba([255, 255, 255, alpha])
        });
        assert_eq!(
            render(&image, true),
            "/* XPM */
static char * test[] = {
\"2 1 2 1\",
\"  c #FFFFFF\",
\". c None\",
\" .\"
};
"
        );
    }

    #[test]
    fn empty_image() {
        assert_eq!(
            render(&RgbaImage::new(0, 0), false),
            "/* XPM */\nstatic char * test[] = {\n\"0 0 0 1\",\n};\n"
        );
    }
}
