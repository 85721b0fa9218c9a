use std::collections::HashSet;
use std::fs;

use image::{Rgba, RgbaImage};
use image_xpm::xpm::{decode, decode_dimensions, encode, XpmDecoder, XpmEncoder};
use sha2::{Digest, Sha256};

const CATS_XPM: &str = "tests/images/xpm/cats.xpm";
const CATS_PNG: &str = "tests/images/xpm/cats.png";
const CATS_SHA256: &str = "ee89234307e67649683fbff1d65daf13e3414199a731e3ecff578911bedbf558";

fn distinct_colors(image: &RgbaImage) -> usize {
    image.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

/// An image in which nearly every pixel has its own color
fn noisy(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(2654435761).wrapping_add(y.wrapping_mul(40503));
        Rgba([v as u8, (v >> 8) as u8, (v >> 16) as u8, 255])
    })
}

/// Color codes from the color table of an encoded file
fn color_codes(text: &[u8]) -> Vec<String> {
    let text = std::str::from_utf8(text).unwrap();
    let mut lines = text.lines().skip(2);
    let values = lines.next().unwrap().trim_matches(|c| c == '"' || c == ',');
    let fields: Vec<usize> = values.split(' ').map(|f| f.parse().unwrap()).collect();
    let (ncolors, cpp) = (fields[2], fields[3]);

    lines
        .take(ncolors)
        .map(|line| line[1..1 + cpp].to_string())
        .collect()
}

#[test]
fn single_color_roundtrip() {
    for (width, height) in [(1, 1), (7, 3), (64, 1), (1, 40), (100, 100)] {
        let image = RgbaImage::from_pixel(width, height, Rgba([12, 34, 56, 255]));
        let text = encode(&image, "single").unwrap();
        assert_eq!(decode(&text).unwrap(), image);
    }
}

#[test]
fn lossless_up_to_80_colors() {
    let image = RgbaImage::from_fn(16, 5, |x, y| Rgba([(x * 16) as u8, (y * 50) as u8, 7, 255]));
    assert_eq!(distinct_colors(&image), 80);

    let text = encode(&image, "full").unwrap();
    assert_eq!(color_codes(&text).iter().collect::<HashSet<_>>().len(), 80);
    assert_eq!(decode(&text).unwrap(), image);
}

#[test]
fn distinct_codes_past_42_colors() {
    for colors in [42, 43, 69, 80] {
        let image = RgbaImage::from_fn(colors, 3, |x, _| Rgba([x as u8, (x * 3) as u8, 9, 255]));
        let text = encode(&image, "codes").unwrap();

        let codes = color_codes(&text);
        assert_eq!(codes.len(), colors as usize);
        assert_eq!(codes.iter().collect::<HashSet<_>>().len(), codes.len());
        assert_eq!(decode(&text).unwrap(), image);
    }
}

#[test]
fn lossy_over_80_colors() {
    let image = noisy(50, 40);
    assert!(distinct_colors(&image) > 80);

    let text = encode(&image, "noisy").unwrap();
    let decoded = decode(&text).unwrap();
    assert_eq!(decoded.dimensions(), (50, 40));
    assert!(distinct_colors(&decoded) <= 80);
}

#[test]
fn wider_codes_avoid_quantization() {
    let image = noisy(30, 30);
    assert!(distinct_colors(&image) > 80);

    let mut text = Vec::new();
    XpmEncoder::new(&mut text)
        .with_chars_per_pixel(2)
        .encode_image(&image)
        .unwrap();
    let codes = color_codes(&text);
    assert_eq!(codes.len(), 900);
    assert_eq!(codes.iter().collect::<HashSet<_>>().len(), 900);
    assert_eq!(decode(&text).unwrap(), image);
}

#[test]
fn transparency_roundtrip() {
    let image = RgbaImage::from_fn(4, 4, |x, y| {
        if x == y {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([200, 100, 50, 255])
        }
    });

    // Alpha is dropped by default
    let decoded = decode(&encode(&image, "t").unwrap()).unwrap();
    assert_eq!(decoded.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));

    let mut text = Vec::new();
    XpmEncoder::new(&mut text)
        .with_transparency(true)
        .encode_image(&image)
        .unwrap();
    assert_eq!(decode(&text).unwrap(), image);
}

#[test]
fn quantized_with_transparency() {
    let image = noisy(20, 20);
    let image = RgbaImage::from_fn(20, 20, |x, y| {
        if x % 7 == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            *image.get_pixel(x, y)
        }
    });

    let mut text = Vec::new();
    XpmEncoder::new(&mut text)
        .with_transparency(true)
        .encode_image(&image)
        .unwrap();
    let codes = color_codes(&text);
    assert!(codes.len() <= 80);
    assert_eq!(codes.iter().collect::<HashSet<_>>().len(), codes.len());

    let decoded = decode(&text).unwrap();
    assert_eq!(decoded.dimensions(), (20, 20));
    assert!(distinct_colors(&decoded) <= 80);
}

#[test]
fn dimension_probe_matches_decode() {
    let data = fs::read(CATS_XPM).unwrap();
    assert_eq!(decode_dimensions(&data).unwrap(), (32, 32));

    let image = decode(&data).unwrap();
    assert_eq!(image.dimensions(), (32, 32));

    let decoder = XpmDecoder::new(&data[..]).unwrap();
    assert_eq!(image::ImageDecoder::dimensions(&decoder), (32, 32));
}

#[test]
fn comments_with_quotes() {
    let data = fs::read("tests/images/xpm/comments.xpm").unwrap();
    let image = decode(&data).unwrap();
    assert_eq!(image.dimensions(), (4, 3));
    assert_eq!(image.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    assert_eq!(image.get_pixel(2, 0), &Rgba([0, 0, 0, 0]));
    assert_eq!(image.get_pixel(3, 1), &Rgba([0, 255, 0, 255]));
}

#[test]
fn encoding_is_pinned() {
    let image = image::open(CATS_PNG).unwrap().into_rgba8();

    let first = encode(&image, "cats").unwrap();
    let second = encode(&image, "cats").unwrap();
    assert_eq!(first, second);
    assert_eq!(first, fs::read(CATS_XPM).unwrap());

    let digest = Sha256::digest(&first);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    assert_eq!(hex, CATS_SHA256);
}

#[test]
fn code_assignment_is_deterministic() {
    let image = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 8 + y) as u8, 0, 0, 255]));
    let a = encode(&image, "a").unwrap();
    let b = encode(&image, "a").unwrap();
    assert_eq!(a, b);

    // Colors are coded in order of first appearance
    let text = String::from_utf8(a).unwrap();
    assert!(text.contains("\"  c #000000\",\n\". c #080000\",\n\"o c #100000\","));
}

#[test]
fn names_are_sanitized() {
    let image = RgbaImage::new(1, 1);
    let text = String::from_utf8(encode(&image, "3D Model").unwrap()).unwrap();
    assert!(text.starts_with("/* XPM */\nstatic char * _D_Model[] = {\n"));

    let text = String::from_utf8(encode(&image, "").unwrap()).unwrap();
    assert!(text.contains("static char * image[] = {"));
}
