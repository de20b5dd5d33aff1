//! The drawing client's wire format and the request handler built on it.
//!
//! The client keeps a 64x64 grid of on/off cells packed into 512 bytes, one
//! bit per cell, and submits it base64-encoded. Decoding yields the same
//! kind of [`RasterImage`](structures::RasterImage) the renderer produces,
//! so a model trained on rendered drawings sees served drawings the same way.

#[macro_use]
extern crate serde_derive;

mod codec;
mod errors;
pub mod serving;

pub use crate::codec::{decode_payload, encode_payload, BitGrid, GRID_SIDE, PAYLOAD_LEN};
pub use crate::errors::{ServeError, WireError};
