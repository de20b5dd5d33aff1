use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::iter::FusedIterator;
use std::path::Path;

use log::{debug, warn};
use structures::{Drawing, Stroke};

use crate::{
    constants::{BINCODE_CONFIG, HEADER_LEN, POINT_COUNT_LEN},
    errors::DecodeError,
    record_header::RecordHeader,
};

/// Outcome of pulling one record from a [`DrawingReader`].
#[derive(Debug)]
pub enum Pull {
    Drawing(Drawing),
    /// The stream is exhausted. A trailing partial header also ends the
    /// stream rather than failing it.
    End,
    /// The record is structurally broken; nothing more can be read from
    /// this stream.
    Failed(DecodeError),
}

/// Lazily decodes drawing records from a byte stream.
///
/// Once the reader returns [`Pull::End`] or [`Pull::Failed`] it keeps
/// returning `End`. To read a file again, open a new reader.
pub struct DrawingReader<R: Read> {
    reader: R,
    records_read: u64,
    done: bool,
}

impl DrawingReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> DrawingReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            records_read: 0,
            done: false,
        }
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn pull(&mut self) -> Pull {
        if self.done {
            return Pull::End;
        }

        let pulled = self.read_record();
        if !matches!(pulled, Pull::Drawing(_)) {
            self.done = true;
        }

        pulled
    }

    fn read_record(&mut self) -> Pull {
        let record = self.records_read;

        let mut header_buf = [0u8; HEADER_LEN];
        let filled = match fill(&mut self.reader, &mut header_buf) {
            Ok(filled) => filled,
            Err(source) => return Pull::Failed(DecodeError::Io { record, source }),
        };

        if filled == 0 {
            debug!("end of stream after {} records", record);
            return Pull::End;
        }

        if filled < HEADER_LEN {
            warn!("ignoring {} trailing bytes after {} records", filled, record);
            return Pull::End;
        }

        let header: RecordHeader = match bincode::decode_from_slice(&header_buf, BINCODE_CONFIG)
        {
            Ok((header, _)) => header,
            Err(source) => return Pull::Failed(DecodeError::Header { record, source }),
        };

        let mut strokes = Vec::with_capacity(header.n_strokes as usize);
        for stroke in 0..header.n_strokes {
            match self.read_stroke(record, stroke) {
                Ok(s) => strokes.push(s),
                Err(err) => return Pull::Failed(err),
            }
        }

        self.records_read += 1;

        Pull::Drawing(Drawing {
            id: header.key_id,
            country_code: header.country_code,
            recognized: header.recognized != 0,
            timestamp: header.timestamp,
            strokes,
        })
    }

    fn read_stroke(&mut self, record: u64, stroke: u16) -> Result<Stroke, DecodeError> {
        let mut count_buf = [0u8; POINT_COUNT_LEN];
        self.read_stroke_bytes(&mut count_buf, record, stroke)?;

        let (n_points, _): (u16, usize) = bincode::decode_from_slice(&count_buf, BINCODE_CONFIG)
            .map_err(|source| DecodeError::Header { record, source })?;

        let mut x = vec![0u8; n_points as usize];
        self.read_stroke_bytes(&mut x, record, stroke)?;
        let mut y = vec![0u8; n_points as usize];
        self.read_stroke_bytes(&mut y, record, stroke)?;

        Ok(Stroke::new(x, y)?)
    }

    fn read_stroke_bytes(
        &mut self,
        buf: &mut [u8],
        record: u64,
        stroke: u16,
    ) -> Result<(), DecodeError> {
        let available =
            fill(&mut self.reader, buf).map_err(|source| DecodeError::Io { record, source })?;

        if available < buf.len() {
            return Err(DecodeError::TruncatedStroke {
                record,
                stroke,
                expected: buf.len(),
                available,
            });
        }

        Ok(())
    }
}

impl<R: Read> Iterator for DrawingReader<R> {
    type Item = Result<Drawing, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pull() {
            Pull::Drawing(drawing) => Some(Ok(drawing)),
            Pull::End => None,
            Pull::Failed(err) => Some(Err(err)),
        }
    }
}

impl<R: Read> FusedIterator for DrawingReader<R> {}

/// Reads until `buf` is full or the stream ends, returning how many bytes
/// were read. Unlike `read_exact`, a short read is not an error.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }

    Ok(filled)
}
