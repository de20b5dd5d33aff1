use bincode::config::{Configuration, Fixint, LittleEndian, NoLimit};

// Fixed-width little-endian integers, the layout the quickdraw export uses
pub const BINCODE_CONFIG: Configuration<LittleEndian, Fixint, NoLimit> =
    bincode::config::legacy();

/// Size of the fixed part of a record: key id, country code, recognized
/// flag, timestamp and stroke count.
pub const HEADER_LEN: usize = 8 + 2 + 1 + 4 + 2;

pub const POINT_COUNT_LEN: usize = 2;
