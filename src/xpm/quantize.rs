//! Color reduction for images with more colors than there are XPM symbols.
//!
//! The target palette is a plain sample of the image's own colors; the pixels
//! are then mapped onto it with Floyd-Steinberg error diffusion, using the
//! ditherer of the `image` crate.

use std::collections::HashSet;

use image::imageops::{self, ColorMap};
use image::{Rgba, RgbaImage};
use log::debug;

/// A palette of colors picked from an image at a regular stride
pub(super) struct SampledPalette {
    colors: Vec<Rgba<u8>>,
}

impl SampledPalette {
    /// Take every `width * height / max_colors`-th pixel in row-major order,
    /// keeping the first `max_colors` distinct colors met.
    pub(super) fn sample(image: &RgbaImage, max_colors: usize) -> SampledPalette {
        let pixels = image.width() as usize * image.height() as usize;
        let step = (pixels / max_colors.max(1)).max(1);

        let mut seen = HashSet::new();
        let mut colors = Vec::new();
        for pixel in image.pixels().step_by(step) {
            if colors.len() >= max_colors {
                break;
            }
            if seen.insert(pixel.0) {
                colors.push(*pixel);
            }
        }

        SampledPalette { colors }
    }

    pub(super) fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    /// Index of the closest palette color by squared RGBA distance; ties go to the
    /// earlier entry.
    fn nearest(&self, color: &Rgba<u8>) -> Option<usize> {
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| distance(entry, color))
            .map(|(index, _)| index)
    }
}

fn distance(a: &Rgba<u8>, b: &Rgba<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u32;
            d * d
        })
        .sum()
}

impl ColorMap for SampledPalette {
    type Color = Rgba<u8>;

    fn index_of(&self, color: &Rgba<u8>) -> usize {
        self.nearest(color).unwrap_or(0)
    }

    fn map_color(&self, color: &mut Rgba<u8>) {
        if let Some(index) = self.nearest(color) {
            *color = self.colors[index];
        }
    }
}

/// Reduce `image` to at most `max_colors` distinct colors. This is lossy.
pub(super) fn reduce(image: &RgbaImage, max_colors: usize) -> RgbaImage {
    let palette = SampledPalette::sample(image, max_colors);
    debug!(
        "Quantizing {}x{} image to a sampled palette of {} colors",
        image.width(),
        image.height(),
        palette.colors().len()
    );

    let mut out = image.clone();
    // Error diffusion needs a neighbor to the right and below
    if out.width() >= 2 && out.height() >= 2 {
        imageops::dither(&mut out, &palette);
    }
    // Snap every pixel onto the palette; a no-op for pixels the ditherer mapped
    for pixel in out.pixels_mut() {
        palette.map_color(pixel);
    }
    out
}
