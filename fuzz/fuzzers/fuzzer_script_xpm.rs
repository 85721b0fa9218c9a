#![no_main]
#[macro_use]
extern crate libfuzzer_sys;

use image::ImageDecoder;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let _ = image_xpm::xpm::decode_dimensions(data);

    let reader = Cursor::new(data);
    let Ok(mut decoder) = image_xpm::xpm::XpmDecoder::new(reader) else {
        return;
    };
    let mut limits = image::Limits::default();
    limits.max_alloc = Some(1024 * 1024); // 1 MiB
    if limits.reserve(decoder.total_bytes()).is_err() {
        return;
    }
    if decoder.set_limits(limits).is_err() {
        return;
    }
    let Ok(image) = image::DynamicImage::from_decoder(decoder) else {
        return;
    };

    // Whatever decodes must encode again
    let image = image.into_rgba8();
    if image.as_raw().len() <= 64 * 1024 {
        let _ = std::hint::black_box(image_xpm::xpm::encode(&image, "fuzz"));
    }
});
