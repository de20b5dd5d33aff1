use std::io;
use std::path::PathBuf;

use structures::StrokeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("read failed in record {record}: {source}")]
    Io { record: u64, source: io::Error },
    #[error("record {record} has a malformed header: {source}")]
    Header {
        record: u64,
        source: bincode::error::DecodeError,
    },
    #[error("record {record}, stroke {stroke}: needed {expected} bytes but only {available} remain")]
    TruncatedStroke {
        record: u64,
        stroke: u16,
        expected: usize,
        available: usize,
    },
    #[error(transparent)]
    Stroke(#[from] StrokeError),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("drawing {id} has {count} strokes, the format allows at most 65535")]
    TooManyStrokes { id: u64, count: usize },
    #[error("drawing {id} has a stroke with {count} points, the format allows at most 65535")]
    TooManyPoints { id: u64, count: usize },
    #[error("could not encode record header: {0}")]
    Header(#[from] bincode::error::EncodeError),
    #[error("could not write record: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
    #[error("line {line}: key id {value:?} is not an unsigned 64-bit integer")]
    KeyId { line: usize, value: String },
    #[error("line {line}: country code {value:?} is not two ASCII characters")]
    CountryCode { line: usize, value: String },
    #[error("line {line}: could not parse timestamp {value:?}: {source}")]
    Timestamp {
        line: usize,
        value: String,
        source: chrono::ParseError,
    },
    #[error("line {line}: timestamp {value:?} does not fit in 32 bits")]
    TimestampRange { line: usize, value: String },
    #[error("line {line}: {source}")]
    Stroke { line: usize, source: StrokeError },
    #[error("could not read input: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
