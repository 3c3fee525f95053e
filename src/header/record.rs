//! Record header codec: the 14-word, 56-byte header fronting every record.

use crate::byte_order::{ceil_div4, pad, ByteOrder};
use crate::compression::CompressionType;
use crate::data_type::{EventType, HeaderType};
use crate::error::{HipoError, Result};
use crate::header::bitinfo::{BitInfo, CURRENT_VERSION, MIN_SUPPORTED_VERSION};

/// Number of 32-bit words in a normal-sized record/file header.
pub const HEADER_SIZE_WORDS: u32 = 14;
/// Number of bytes in a normal-sized record/file header.
pub const HEADER_SIZE_BYTES: usize = 56;
/// Magic number used to detect and resolve byte order.
pub const MAGIC: u32 = 0xC0DA_0100;

const RECORD_LENGTH_OFFSET: usize = 0;
const RECORD_NUMBER_OFFSET: usize = 4;
const HEADER_LENGTH_OFFSET: usize = 8;
const EVENT_COUNT_OFFSET: usize = 12;
const INDEX_ARRAY_OFFSET: usize = 16;
const BIT_INFO_OFFSET: usize = 20;
const USER_LENGTH_OFFSET: usize = 24;
const MAGIC_OFFSET: usize = 28;
const UNCOMPRESSED_LENGTH_OFFSET: usize = 32;
const COMPRESSION_TYPE_OFFSET: usize = 36;
const REGISTER1_OFFSET: usize = 40;
const REGISTER2_OFFSET: usize = 48;

/// In-memory representation of a 56-byte record (or file) header.
///
/// `RecordHeader` and [`super::file::FileHeader`] share this exact 14-word
/// layout; a `FileHeader` additionally repurposes `user_register_1` to hold
/// the trailer's file position once the file is closed, which is why both
/// wrap this same struct rather than duplicating the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub header_type: HeaderType,
    pub byte_order: ByteOrder,
    pub record_length_words: u32,
    pub record_number: u32,
    pub header_length_words: u32,
    pub entries: u32,
    pub index_length: u32,
    pub version: u32,
    pub has_dictionary: bool,
    pub has_first_event: bool,
    pub is_last_record: bool,
    pub event_type: EventType,
    pub user_header_length: u32,
    pub uncompressed_data_length: u32,
    pub compression_type: CompressionType,
    pub compressed_data_length_words: u32,
    /// Bytes of padding folded into `compressed_data_length_words`; not
    /// derivable from the word count alone once the original byte count is
    /// lost to rounding, so it is tracked explicitly.
    pub compressed_length_padding: u32,
    pub user_register_1: u64,
    pub user_register_2: u64,
}

impl Default for RecordHeader {
    fn default() -> Self {
        RecordHeader {
            header_type: HeaderType::HipoRecord,
            byte_order: ByteOrder::Little,
            record_length_words: HEADER_SIZE_WORDS,
            record_number: 1,
            header_length_words: HEADER_SIZE_WORDS,
            entries: 0,
            index_length: 0,
            version: CURRENT_VERSION,
            has_dictionary: false,
            has_first_event: false,
            is_last_record: false,
            event_type: EventType::RocRaw,
            user_header_length: 0,
            uncompressed_data_length: 0,
            compression_type: CompressionType::Uncompressed,
            compressed_data_length_words: 0,
            compressed_length_padding: 0,
            user_register_1: 0,
            user_register_2: 0,
        }
    }
}

impl RecordHeader {
    pub fn new() -> RecordHeader {
        RecordHeader::default()
    }

    // ---- derived quantities ----

    pub fn user_header_length_padding(&self) -> u32 {
        pad(self.user_header_length)
    }

    pub fn user_header_length_words(&self) -> u32 {
        ceil_div4(self.user_header_length)
    }

    pub fn data_length_padding(&self) -> u32 {
        pad(self.uncompressed_data_length)
    }

    pub fn data_length_words(&self) -> u32 {
        ceil_div4(self.uncompressed_data_length)
    }

    pub fn compressed_data_length_padding(&self) -> u32 {
        // Low 2 bits of the padding triple aren't separately derivable from
        // the word count alone once compressed; callers that compress set
        // this explicitly via `set_compressed_data_length`.
        self.compressed_length_padding
    }

    pub fn user_register_1(&self) -> u64 {
        self.user_register_1
    }

    pub fn set_user_register_1(&mut self, value: u64) {
        self.user_register_1 = value;
    }

    pub fn user_register_2(&self) -> u64 {
        self.user_register_2
    }

    pub fn set_user_register_2(&mut self, value: u64) {
        self.user_register_2 = value;
    }

    pub fn header_length_bytes(&self) -> u32 {
        self.header_length_words * 4
    }

    pub fn record_length_bytes(&self) -> u32 {
        self.record_length_words * 4
    }

    pub fn compressed_data_length_bytes(&self) -> u32 {
        self.compressed_data_length_words * 4 - self.compressed_length_padding
    }

    /// Set the compressed data length (bytes) and derive the padded word
    /// count and padding bits together, so the two never drift apart.
    pub fn set_compressed_data_length(&mut self, bytes: u32) {
        self.compressed_length_padding = pad(bytes);
        self.compressed_data_length_words = ceil_div4(bytes);
    }

    // ---- encode ----

    /// Encode this header to a fresh 56-byte buffer in `self.byte_order`.
    pub fn encode(&self) -> [u8; HEADER_SIZE_BYTES] {
        let mut buf = [0u8; HEADER_SIZE_BYTES];
        self.encode_into(&mut buf);
        buf
    }

    pub fn encode_into(&self, buf: &mut [u8]) {
        let bo = self.byte_order;
        bo.write_u32(&mut buf[RECORD_LENGTH_OFFSET..], self.record_length_words);
        bo.write_u32(&mut buf[RECORD_NUMBER_OFFSET..], self.record_number);
        bo.write_u32(&mut buf[HEADER_LENGTH_OFFSET..], self.header_length_words);
        bo.write_u32(&mut buf[EVENT_COUNT_OFFSET..], self.entries);
        bo.write_u32(&mut buf[INDEX_ARRAY_OFFSET..], self.index_length);

        let bit_info = BitInfo {
            version: self.version,
            has_dictionary: self.has_dictionary,
            has_first_event: self.has_first_event,
            is_last_record: self.is_last_record,
            event_type: self.event_type,
            user_header_padding: self.user_header_length_padding(),
            data_padding: self.data_length_padding(),
            compressed_data_padding: self.compressed_length_padding,
            header_type: self.header_type,
        };
        bo.write_u32(&mut buf[BIT_INFO_OFFSET..], bit_info.encode());

        bo.write_u32(&mut buf[USER_LENGTH_OFFSET..], self.user_header_length);
        bo.write_u32(&mut buf[MAGIC_OFFSET..], MAGIC);
        bo.write_u32(&mut buf[UNCOMPRESSED_LENGTH_OFFSET..], self.uncompressed_data_length);

        let compression_word =
            ((self.compression_type.to_value() as u32) << 28) | (self.compressed_data_length_words & 0x0FFF_FFFF);
        bo.write_u32(&mut buf[COMPRESSION_TYPE_OFFSET..], compression_word);

        bo.write_u64(&mut buf[REGISTER1_OFFSET..], self.user_register_1);
        bo.write_u64(&mut buf[REGISTER2_OFFSET..], self.user_register_2);
    }

    /// Decode a header from `buf[offset..offset+56]`. `buf`'s length beyond
    /// `offset` must be at least 56 bytes.
    ///
    /// Magic-word detection: the caller's assumed byte order is tried first;
    /// if the magic reads as the byte-swapped value, the opposite order is
    /// adopted instead.
    pub fn decode(buf: &[u8], offset: usize, assumed_order: ByteOrder) -> Result<RecordHeader> {
        if buf.len() < offset + HEADER_SIZE_BYTES {
            return Err(HipoError::TruncatedBuffer {
                offset,
                needed: HEADER_SIZE_BYTES,
                available: buf.len().saturating_sub(offset),
            });
        }
        let window = &buf[offset..offset + HEADER_SIZE_BYTES];

        let raw_magic_assumed = assumed_order.read_u32(&window[MAGIC_OFFSET..]);
        let byte_order = if raw_magic_assumed == MAGIC {
            assumed_order
        } else if raw_magic_assumed.swap_bytes() == MAGIC {
            assumed_order.opposite()
        } else {
            return Err(HipoError::MalformedHeader {
                offset: offset as u64,
                reason: format!("bad magic word 0x{raw_magic_assumed:08X}"),
            });
        };

        let bo = byte_order;
        let bit_info_word = bo.read_u32(&window[BIT_INFO_OFFSET..]);
        let bit_info = BitInfo::decode(bit_info_word);
        if bit_info.version < MIN_SUPPORTED_VERSION {
            return Err(HipoError::UnsupportedVersion {
                offset: offset as u64,
                version: bit_info.version,
            });
        }

        let header_length_words = bo.read_u32(&window[HEADER_LENGTH_OFFSET..]);
        if header_length_words < HEADER_SIZE_WORDS {
            return Err(HipoError::MalformedHeader {
                offset: offset as u64,
                reason: format!("header length {header_length_words} words is less than the minimum 14"),
            });
        }

        let index_length = bo.read_u32(&window[INDEX_ARRAY_OFFSET..]);
        if index_length % 4 != 0 {
            return Err(HipoError::MalformedHeader {
                offset: offset as u64,
                reason: format!("index array length {index_length} is not a multiple of 4"),
            });
        }

        let compression_word = bo.read_u32(&window[COMPRESSION_TYPE_OFFSET..]);
        let compression_code = (compression_word >> 28) as u32;
        let compression_type = CompressionType::from_value(compression_code as u8).ok_or_else(|| {
            HipoError::UnsupportedCompression {
                offset: offset as u64,
                code: compression_code,
            }
        })?;
        let compressed_data_length_words = compression_word & 0x0FFF_FFFF;

        Ok(RecordHeader {
            header_type: bit_info.header_type,
            byte_order,
            record_length_words: bo.read_u32(&window[RECORD_LENGTH_OFFSET..]),
            record_number: bo.read_u32(&window[RECORD_NUMBER_OFFSET..]),
            header_length_words,
            entries: bo.read_u32(&window[EVENT_COUNT_OFFSET..]),
            index_length,
            version: bit_info.version,
            has_dictionary: bit_info.has_dictionary,
            has_first_event: bit_info.has_first_event,
            is_last_record: bit_info.is_last_record,
            event_type: bit_info.event_type,
            user_header_length: bo.read_u32(&window[USER_LENGTH_OFFSET..]),
            uncompressed_data_length: bo.read_u32(&window[UNCOMPRESSED_LENGTH_OFFSET..]),
            compression_type,
            compressed_data_length_words,
            user_register_1: bo.read_u64(&window[REGISTER1_OFFSET..]),
            user_register_2: bo.read_u64(&window[REGISTER2_OFFSET..]),
            compressed_length_padding: bit_info.compressed_data_padding,
        })
    }
}

impl std::fmt::Display for RecordHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RecordHeader {{ type: {:?}, order: {:?}, record#: {}, entries: {}, \
             header_words: {}, index_bytes: {}, user_header_bytes: {}, \
             uncompressed_bytes: {}, compression: {:?} }}",
            self.header_type,
            self.byte_order,
            self.record_number,
            self.entries,
            self.header_length_words,
            self.index_length,
            self.user_header_length,
            self.uncompressed_data_length,
            self.compression_type
        )
    }
}
