//! Import from the quickdraw "simplified" ndjson export, one drawing per
//! line:
//!
//! ```json
//! {"key_id":"5152802093400064","countrycode":"US","recognized":true,
//!  "timestamp":"2017-03-28 15:03:22.81802 UTC","word":"cat",
//!  "drawing":[[[0,255],[0,255]],[[255,0],[0,255]]]}
//! ```

use std::io::{BufRead, Write};

use chrono::NaiveDateTime;
use log::warn;
use serde_derive::Deserialize;
use structures::{Drawing, Stroke};

use crate::{errors::ImportError, DrawingWriter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f UTC";

#[derive(Deserialize)]
struct SimplifiedDrawing {
    key_id: String,
    countrycode: String,
    recognized: bool,
    timestamp: String,
    drawing: Vec<(Vec<u8>, Vec<u8>)>,
}

/// Parses one ndjson line. `line_number` is only used in error messages.
pub fn parse_line(line: &str, line_number: usize) -> Result<Drawing, ImportError> {
    let raw: SimplifiedDrawing = serde_json::from_str(line).map_err(|source| ImportError::Json {
        line: line_number,
        source,
    })?;

    let id = raw.key_id.parse::<u64>().map_err(|_| ImportError::KeyId {
        line: line_number,
        value: raw.key_id.clone(),
    })?;

    let country_code: [u8; 2] = match raw.countrycode.as_bytes() {
        [a, b] if a.is_ascii() && b.is_ascii() => [*a, *b],
        _ => {
            return Err(ImportError::CountryCode {
                line: line_number,
                value: raw.countrycode,
            })
        }
    };

    let drawn_at = NaiveDateTime::parse_from_str(&raw.timestamp, TIMESTAMP_FORMAT).map_err(
        |source| ImportError::Timestamp {
            line: line_number,
            value: raw.timestamp.clone(),
            source,
        },
    )?;
    let timestamp = u32::try_from(drawn_at.and_utc().timestamp()).map_err(|_| {
        ImportError::TimestampRange {
            line: line_number,
            value: raw.timestamp.clone(),
        }
    })?;

    let strokes = raw
        .drawing
        .into_iter()
        .map(|(x, y)| Stroke::new(x, y))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ImportError::Stroke {
            line: line_number,
            source,
        })?;

    Ok(Drawing {
        id,
        country_code,
        recognized: raw.recognized,
        timestamp,
        strokes,
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub written: u64,
    pub skipped: u64,
}

/// Converts an ndjson stream into binary records. Lines that fail to parse
/// are logged and skipped; I/O and encoding errors abort the import.
pub fn import<R: BufRead, W: Write>(
    reader: R,
    writer: &mut DrawingWriter<W>,
) -> Result<ImportSummary, ImportError> {
    let mut summary = ImportSummary::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line, i + 1) {
            Ok(drawing) => {
                writer.write(&drawing)?;
                summary.written += 1;
            }
            Err(err) => {
                warn!("skipping drawing: {}", err);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}
