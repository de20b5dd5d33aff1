use crate::errors::EncodingError;
use crate::raster::RasterImage;

/// Bumped whenever rendering or wire semantics change in a way that would
/// make a previously trained model see different pixels.
pub const RASTER_ENCODING_VERSION: u16 = 1;

/// Grid side of a client-submitted drawing.
pub const WIRE_SIDE: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    /// `pixels[y * side + x]`, `(0, 0)` in the top left corner.
    RowMajorTopLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InkConvention {
    /// Antialiased coverage in `0..=255`.
    Graded,
    /// Coverage at or above `threshold` is full ink, everything else is
    /// background.
    Binary { threshold: u8 },
}

/// The raster contract shared by the training renderer and the serving wire
/// codec. A model is only valid for inputs produced under the encoding it
/// was trained with.
///
/// `line_diameter` and `padding` are in source canvas units (the 256x256
/// quickdraw canvas), not output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterEncoding {
    pub version: u16,
    pub side: u32,
    pub line_diameter: f32,
    pub padding: f32,
    pub layout: PixelLayout,
    pub ink: InkConvention,
}

impl RasterEncoding {
    /// 28x28 antialiased bitmaps.
    pub const QUICKDRAW_28: Self = Self {
        version: RASTER_ENCODING_VERSION,
        side: 28,
        line_diameter: 16.0,
        padding: 16.0,
        layout: PixelLayout::RowMajorTopLeft,
        ink: InkConvention::Graded,
    };

    /// 64x64 binary bitmaps, matching what the drawing client submits. The
    /// line diameter works out to roughly the client's two-cell brush.
    pub const WIRE_64: Self = Self {
        version: RASTER_ENCODING_VERSION,
        side: WIRE_SIDE,
        line_diameter: 8.0,
        padding: 16.0,
        layout: PixelLayout::RowMajorTopLeft,
        ink: InkConvention::Binary { threshold: 128 },
    };

    pub fn validate(&self) -> Result<(), EncodingError> {
        if self.version != RASTER_ENCODING_VERSION {
            return Err(EncodingError::UnsupportedVersion(self.version));
        }
        if self.side == 0 {
            return Err(EncodingError::ZeroSide);
        }
        for (name, value) in [
            ("line diameter", self.line_diameter),
            ("padding", self.padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EncodingError::InvalidLength { name, value });
            }
        }

        Ok(())
    }

    /// Whether a grid decoded from the wire can be fed to a model trained
    /// under this encoding.
    pub fn is_wire_compatible(&self) -> bool {
        self.version == RASTER_ENCODING_VERSION
            && self.side == WIRE_SIDE
            && self.layout == PixelLayout::RowMajorTopLeft
            && matches!(self.ink, InkConvention::Binary { .. })
    }

    pub fn apply_ink(&self, image: RasterImage) -> RasterImage {
        match self.ink {
            InkConvention::Graded => image,
            InkConvention::Binary { threshold } => image.binarize(threshold),
        }
    }
}

impl Default for RasterEncoding {
    fn default() -> Self {
        Self::QUICKDRAW_28
    }
}
