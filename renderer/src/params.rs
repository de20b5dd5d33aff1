use structures::{RasterEncoding, CANVAS_SIDE};

use crate::errors::RenderError;

/// Output geometry. `line_diameter` and `padding` are in source canvas
/// units, so the same values give the same look at any `side`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub side: u32,
    pub line_diameter: f32,
    pub padding: f32,
}

impl RenderParams {
    pub fn new(side: u32, line_diameter: f32, padding: f32) -> Self {
        Self {
            side,
            line_diameter,
            padding,
        }
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.side == 0 {
            return Err(RenderError::ZeroSide);
        }
        for (name, value) in [
            ("line diameter", self.line_diameter),
            ("padding", self.padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RenderError::InvalidLength { name, value });
            }
        }

        Ok(())
    }

    pub fn transform(&self) -> CanvasTransform {
        CanvasTransform::new(self)
    }
}

impl From<&RasterEncoding> for RenderParams {
    fn from(encoding: &RasterEncoding) -> Self {
        Self::new(encoding.side, encoding.line_diameter, encoding.padding)
    }
}

/// Maps source canvas coordinates to output pixel coordinates: scale first,
/// then translate by half the total padding in the scaled space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    scale: f32,
    translate: f32,
}

impl CanvasTransform {
    fn new(params: &RenderParams) -> Self {
        // padding on both sides, plus room for half a line past each edge
        let total_padding = params.padding * 2.0 + params.line_diameter;

        Self {
            scale: params.side as f32 / (CANVAS_SIDE + total_padding),
            translate: total_padding / 2.0,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn to_device(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x + self.translate) * self.scale,
            (y + self.translate) * self.scale,
        )
    }

    pub fn to_device_length(&self, length: f32) -> f32 {
        length * self.scale
    }
}
