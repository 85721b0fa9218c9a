//! Palette construction for the encoder.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};

/// The distinct colors of an image, in the order in which a row-major scan
/// first meets them, together with the palette index of every pixel.
pub(super) struct Palette {
    colors: Vec<Rgba<u8>>,
    lookup: HashMap<[u8; 4], usize>,
    /// Palette index of each pixel, row-major
    indices: Vec<usize>,
    /// Whether fully transparent pixels share a single `None` entry
    transparency: bool,
}

impl Palette {
    /// Scan `image` and collect its palette.
    ///
    /// With `transparency`, every pixel with zero alpha is treated as
    /// `[0, 0, 0, 0]`, so that all of them map to one entry.
    pub(super) fn build(image: &RgbaImage, transparency: bool) -> Palette {
        let mut palette = Palette {
            colors: Vec::new(),
            lookup: HashMap::new(),
            indices: Vec::with_capacity(image.width() as usize * image.height() as usize),
            transparency,
        };

        for pixel in image.pixels() {
            let color = palette.normalize(pixel);
            let next = palette.colors.len();
            let index = *palette.lookup.entry(color.0).or_insert(next);
            if index == next {
                palette.colors.push(color);
            }
            palette.indices.push(index);
        }

        palette
    }

    fn normalize(&self, color: &Rgba<u8>) -> Rgba<u8> {
        if self.transparency && color[3] == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            *color
        }
    }

    pub(super) fn len(&self) -> usize {
        self.colors.len()
    }

    pub(super) fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    pub(super) fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Palette position of `color`, if the image contains it
    pub(super) fn index_of(&self, color: &Rgba<u8>) -> Option<usize> {
        self.lookup.get(&self.normalize(color).0).copied()
    }

    /// Whether the entry is written as the `None` color
    pub(super) fn is_transparent(&self, index: usize) -> bool {
        self.transparency && self.colors[index][3] == 0
    }
}
