use std::io::Write;

use structures::Drawing;

use crate::{constants::BINCODE_CONFIG, errors::EncodeError, record_header::RecordHeader};

/// Encodes one drawing as a complete record.
///
/// Size limits are checked before anything is encoded, so an oversized
/// drawing never produces a partial record.
pub fn encode_drawing(drawing: &Drawing) -> Result<Vec<u8>, EncodeError> {
    let n_strokes =
        u16::try_from(drawing.strokes.len()).map_err(|_| EncodeError::TooManyStrokes {
            id: drawing.id,
            count: drawing.strokes.len(),
        })?;

    if let Some(stroke) = drawing
        .strokes
        .iter()
        .find(|s| s.len() > usize::from(u16::MAX))
    {
        return Err(EncodeError::TooManyPoints {
            id: drawing.id,
            count: stroke.len(),
        });
    }

    let header = RecordHeader {
        key_id: drawing.id,
        country_code: drawing.country_code,
        recognized: i8::from(drawing.recognized),
        timestamp: drawing.timestamp,
        n_strokes,
    };

    let mut buf = Vec::with_capacity(crate::HEADER_LEN + drawing.num_points() * 2);
    bincode::encode_into_std_write(header, &mut buf, BINCODE_CONFIG)?;

    for stroke in &drawing.strokes {
        bincode::encode_into_std_write(stroke.len() as u16, &mut buf, BINCODE_CONFIG)?;
        buf.extend_from_slice(stroke.x());
        buf.extend_from_slice(stroke.y());
    }

    Ok(buf)
}

/// Appends drawing records to a byte sink in the binary drawing format.
pub struct DrawingWriter<W: Write> {
    dest: W,
    records_written: u64,
}

impl<W: Write> DrawingWriter<W> {
    pub fn new(dest: W) -> Self {
        DrawingWriter {
            dest,
            records_written: 0,
        }
    }

    pub fn write(&mut self, drawing: &Drawing) -> Result<(), EncodeError> {
        let record = encode_drawing(drawing)?;
        self.dest.write_all(&record)?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn finish(mut self) -> Result<W, EncodeError> {
        self.dest.flush()?;
        Ok(self.dest)
    }
}

#[cfg(test)]
mod tests {
    use structures::Stroke;

    use super::*;
    use crate::DrawingReader;

    fn drawing(strokes: Vec<Stroke>) -> Drawing {
        Drawing {
            id: 9,
            country_code: *b"JP",
            recognized: false,
            timestamp: 12,
            strokes,
        }
    }

    #[test]
    fn header_is_seventeen_bytes() {
        let bytes = encode_drawing(&drawing(vec![])).unwrap();
        assert_eq!(bytes.len(), crate::HEADER_LEN);
        assert_eq!(&bytes[..8], &9u64.to_le_bytes());
        assert_eq!(&bytes[8..10], b"JP");
        assert_eq!(bytes[10], 0);
        assert_eq!(&bytes[11..15], &12u32.to_le_bytes());
        assert_eq!(&bytes[15..17], &0u16.to_le_bytes());
    }

    #[test]
    fn strokes_are_count_then_xs_then_ys() {
        let bytes = encode_drawing(&drawing(vec![Stroke::from_points(&[(1, 2), (3, 4)])])).unwrap();
        assert_eq!(&bytes[crate::HEADER_LEN..], &[2, 0, 1, 3, 2, 4]);
    }

    #[test]
    fn rejects_oversized_strokes() {
        let long = Stroke::new(vec![0; 70_000], vec![0; 70_000]).unwrap();
        assert!(matches!(
            encode_drawing(&drawing(vec![long])),
            Err(EncodeError::TooManyPoints { id: 9, count: 70_000 })
        ));
    }

    #[test]
    fn writer_output_reads_back() {
        let drawings = vec![
            drawing(vec![Stroke::from_points(&[(5, 6)])]),
            drawing(vec![
                Stroke::from_points(&[(0, 0), (10, 10), (20, 0)]),
                Stroke::from_points(&[(7, 7)]),
            ]),
        ];

        let mut writer = DrawingWriter::new(Vec::new());
        for d in &drawings {
            writer.write(d).unwrap();
        }
        assert_eq!(writer.records_written(), 2);
        let bytes = writer.finish().unwrap();

        let decoded: Vec<Drawing> = DrawingReader::new(bytes.as_slice())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(decoded, drawings);
    }
}
