use structures::RasterError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("drawing has no strokes")]
    NoStrokes,
    #[error("stroke {index} has no points")]
    EmptyStroke { index: usize },
    #[error("output side must be non-zero")]
    ZeroSide,
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidLength { name: &'static str, value: f32 },
    #[error(transparent)]
    Raster(#[from] RasterError),
}
