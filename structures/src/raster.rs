use image::{GrayImage, Luma};

use crate::errors::RasterError;

/// Square single-channel byte grid, row-major with the origin at the top
/// left. `0` is background and `255` is full ink.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RasterImage {
    side: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn from_pixels(side: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        if side == 0 {
            return Err(RasterError::ZeroSide);
        }

        let expected = side as usize * side as usize;
        if pixels.len() != expected {
            return Err(RasterError::PixelCount {
                side,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self { side, pixels })
    }

    /// Builds an image from a per-pixel function, like [`GrayImage::from_fn`].
    ///
    /// Panics if `side` is 0.
    pub fn from_fn(side: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        assert!(side > 0, "raster side must be non-zero");

        let mut pixels = Vec::with_capacity(side as usize * side as usize);
        for y in 0..side {
            for x in 0..side {
                pixels.push(f(x, y));
            }
        }

        Self { side, pixels }
    }

    pub fn from_gray_image(image: &GrayImage) -> Result<Self, RasterError> {
        let (width, height) = image.dimensions();
        if width != height {
            return Err(RasterError::NotSquare { width, height });
        }

        Self::from_pixels(width, image.as_raw().clone())
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Panics if `(x, y)` is outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.side && y < self.side, "pixel ({x}, {y}) out of bounds");
        self.pixels[y as usize * self.side as usize + x as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(self.side as usize)
    }

    pub fn ink_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p > 0).count()
    }

    /// Maps every pixel at or above `threshold` to full ink and the rest to
    /// background.
    pub fn binarize(&self, threshold: u8) -> RasterImage {
        RasterImage {
            side: self.side,
            pixels: self
                .pixels
                .iter()
                .map(|&p| if p >= threshold { u8::MAX } else { 0 })
                .collect(),
        }
    }

    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.side, self.side, |x, y| Luma([self.pixel(x, y)]))
    }
}

/// A rendered drawing paired with its dense class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    pub image: RasterImage,
    pub label: u16,
}
