use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrokeError {
    #[error("stroke has {x} x-coordinates but {y} y-coordinates")]
    MismatchedAxes { x: usize, y: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    #[error("raster side must be non-zero")]
    ZeroSide,
    #[error("raster of side {side} needs {expected} pixels, got {actual}")]
    PixelCount {
        side: u32,
        expected: usize,
        actual: usize,
    },
    #[error("raster must be square, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },
}

#[derive(Debug, Error, PartialEq)]
pub enum EncodingError {
    #[error("raster side must be non-zero")]
    ZeroSide,
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidLength { name: &'static str, value: f32 },
    #[error("unsupported raster encoding version {0}")]
    UnsupportedVersion(u16),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("category {0:?} appears more than once")]
    DuplicateCategory(String),
    #[error("expected {expected} categories, found {actual}")]
    ClassCountMismatch { expected: usize, actual: usize },
    #[error("{0} categories do not fit in a u16 class index")]
    TooManyCategories(usize),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not access manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode manifest: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("could not decode manifest: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("manifest encoding is invalid: {0}")]
    Encoding(#[from] EncodingError),
}
