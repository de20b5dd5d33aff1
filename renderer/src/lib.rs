//! Vector-to-raster rendering of quickdraw strokes.
//!
//! Strokes live on a 256x256 canvas. Rendering scales that canvas into a
//! `side x side` grid with a uniform margin, re-centers the drawing on its
//! bounding box maximum, and paints every stroke as an antialiased polyline
//! with round caps and joins. The result is a pure function of the strokes
//! and the render parameters.

mod canvas;
mod errors;
mod params;
mod render;

pub use crate::errors::RenderError;
pub use crate::params::{CanvasTransform, RenderParams};
pub use crate::render::{centering_offset, render_batch, render_drawing, vector_to_raster};
