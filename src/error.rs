use thiserror::Error;

/// All failure modes of the record codec, the evio structure codec and the
/// composite-data interpreter.
#[derive(Error, Debug)]
pub enum HipoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed header at byte offset 0x{offset:X}: {reason}")]
    MalformedHeader { offset: u64, reason: String },

    #[error("unsupported format version {version} at byte offset 0x{offset:X} (minimum supported is 6)")]
    UnsupportedVersion { offset: u64, version: u32 },

    #[error("unsupported compression type {code} at byte offset 0x{offset:X}")]
    UnsupportedCompression { offset: u64, code: u32 },

    #[error(
        "inconsistent record header at byte offset 0x{offset:X}: index length {index_length} bytes is not 4 * entries ({entries})"
    )]
    InconsistentHeader {
        offset: u64,
        index_length: u32,
        entries: u32,
    },

    #[error("truncated buffer: needed {needed} bytes at offset {offset}, only {available} available")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("event index {index} out of range (record has {entries} entries)")]
    IndexOutOfRange { index: u32, entries: u32 },

    #[error("bad composite-data format: {reason}")]
    BadFormat { reason: String },

    #[error("buffer overflow: destination has {capacity} bytes, {needed} required")]
    BufferOverflow { capacity: usize, needed: usize },

    #[error("compression failure ({codec}): {reason}")]
    CompressionFailure { codec: &'static str, reason: String },

    #[error("record capacity exceeded: limit is {limit}, attempted {attempted}")]
    RecordCapacityExceeded { limit: u32, attempted: u32 },
}

pub type Result<T> = std::result::Result<T, HipoError>;
