//! Reader and writer for the quickdraw binary drawing format.
//!
//! A file holds one category's drawings as back-to-back variable-length
//! records with no file header and no record count; the end of the file is
//! the end of the data.

mod constants;
mod drawing_reader;
mod drawing_writer;
mod errors;
pub mod ndjson;
mod record_header;

pub use crate::constants::HEADER_LEN;
pub use crate::drawing_reader::{DrawingReader, Pull};
pub use crate::drawing_writer::{encode_drawing, DrawingWriter};
pub use crate::errors::{DecodeError, EncodeError, ImportError};
