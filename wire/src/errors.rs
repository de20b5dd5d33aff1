use structures::RasterEncoding;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload decodes to {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("grid side must be {expected}, got {actual}")]
    Side { expected: u32, actual: u32 },
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("model encoding {0:?} does not match the wire encoding")]
    EncodingMismatch(RasterEncoding),
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),
}
