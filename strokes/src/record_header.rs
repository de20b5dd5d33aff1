use bincode::{Decode, Encode};

/// Fixed-size prefix of every drawing record.
#[derive(Encode, Decode, PartialEq, Eq, Debug, Clone, Copy)]
pub struct RecordHeader {
    pub key_id: u64,
    pub country_code: [u8; 2],
    pub recognized: i8,
    pub timestamp: u32,
    pub n_strokes: u16,
}
