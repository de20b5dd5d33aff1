//! Types shared by the training and serving sides of the sketch pipeline.
//!
//! Everything that crosses a crate boundary lives here: decoded drawings,
//! the raster grid both paths produce, the versioned raster encoding
//! contract, and the persisted category table.

#[macro_use]
extern crate serde_derive;

mod drawing;
mod encoding;
mod errors;
mod labels;
mod manifest;
mod raster;

pub use crate::drawing::{bbox_max, Drawing, Stroke, CANVAS_SIDE};
pub use crate::encoding::{
    InkConvention, PixelLayout, RasterEncoding, RASTER_ENCODING_VERSION, WIRE_SIDE,
};
pub use crate::errors::{EncodingError, LabelError, ManifestError, RasterError, StrokeError};
pub use crate::labels::{ClassLabel, LabelTable, UNKNOWN_CATEGORY};
pub use crate::manifest::ModelManifest;
pub use crate::raster::{RasterImage, TrainingExample};
