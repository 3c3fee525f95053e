//! Header codecs for the three evio structure kinds — bank, segment, and
//! tag-segment.
//!
//! Each header's internal bit layout is fixed regardless of the surrounding
//! buffer's byte order; only the on-wire serialization of each 32-bit word
//! is affected by [`ByteOrder`].

use crate::byte_order::ByteOrder;
use crate::data_type::DataType;
use crate::error::{HipoError, Result};

/// 2-word (8-byte) bank header.
///
/// Word 1 is the bank's length in words, excluding the length word itself.
/// Word 2 (big-endian bit layout): `tag:16 | padding:2 | dataType:6 | num:8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankHeader {
    pub length_words: u32,
    pub tag: u16,
    pub data_type: DataType,
    pub padding: u8,
    pub num: u8,
}

impl BankHeader {
    pub const SIZE_BYTES: usize = 8;

    pub fn decode(buf: &[u8], offset: usize, order: ByteOrder) -> Result<BankHeader> {
        require_len(buf, offset, Self::SIZE_BYTES)?;
        let length_words = order.read_u32(&buf[offset..]);
        let word2 = order.read_u32(&buf[offset + 4..]);
        let tag = (word2 >> 16) as u16;
        let padding = ((word2 >> 14) & 0x3) as u8;
        let data_type_val = ((word2 >> 8) & 0x3F) as u8;
        let num = (word2 & 0xFF) as u8;
        let data_type = DataType::from_value(data_type_val).ok_or_else(|| HipoError::MalformedHeader {
            offset: offset as u64,
            reason: format!("unknown bank data type 0x{data_type_val:02X}"),
        })?;
        validate_padding(padding, offset)?;
        Ok(BankHeader {
            length_words,
            tag,
            data_type,
            padding,
            num,
        })
    }

    pub fn encode_into(&self, buf: &mut [u8], order: ByteOrder) {
        order.write_u32(buf, self.length_words);
        let word2 = ((self.tag as u32) << 16)
            | (((self.padding as u32) & 0x3) << 14)
            | (((self.data_type.to_value() as u32) & 0x3F) << 8)
            | (self.num as u32);
        order.write_u32(&mut buf[4..], word2);
    }

    pub fn encode(&self, order: ByteOrder) -> [u8; Self::SIZE_BYTES] {
        let mut buf = [0u8; Self::SIZE_BYTES];
        self.encode_into(&mut buf, order);
        buf
    }
}

/// 1-word (4-byte) segment header: `tag:8 | padding:2 | dataType:6 | length:16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub tag: u8,
    pub data_type: DataType,
    pub padding: u8,
    pub length_words: u16,
}

impl SegmentHeader {
    pub const SIZE_BYTES: usize = 4;

    pub fn decode(buf: &[u8], offset: usize, order: ByteOrder) -> Result<SegmentHeader> {
        require_len(buf, offset, Self::SIZE_BYTES)?;
        let word = order.read_u32(&buf[offset..]);
        let tag = (word >> 24) as u8;
        let padding = ((word >> 22) & 0x3) as u8;
        let data_type_val = ((word >> 16) & 0x3F) as u8;
        let length_words = (word & 0xFFFF) as u16;
        let data_type = DataType::from_value(data_type_val).ok_or_else(|| HipoError::MalformedHeader {
            offset: offset as u64,
            reason: format!("unknown segment data type 0x{data_type_val:02X}"),
        })?;
        validate_padding(padding, offset)?;
        Ok(SegmentHeader {
            tag,
            data_type,
            padding,
            length_words,
        })
    }

    pub fn encode_into(&self, buf: &mut [u8], order: ByteOrder) {
        let word = ((self.tag as u32) << 24)
            | (((self.padding as u32) & 0x3) << 22)
            | (((self.data_type.to_value() as u32) & 0x3F) << 16)
            | (self.length_words as u32);
        order.write_u32(buf, word);
    }

    pub fn encode(&self, order: ByteOrder) -> [u8; Self::SIZE_BYTES] {
        let mut buf = [0u8; Self::SIZE_BYTES];
        self.encode_into(&mut buf, order);
        buf
    }
}

/// 1-word (4-byte) tag-segment header: `tag:12 | dataType:4 | length:16`.
/// No padding field — a legacy structure kind that never carries sub-word
/// primitive leaves with non-zero padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSegmentHeader {
    pub tag: u16,
    pub data_type: DataType,
    pub length_words: u16,
}

impl TagSegmentHeader {
    pub const SIZE_BYTES: usize = 4;

    pub fn decode(buf: &[u8], offset: usize, order: ByteOrder) -> Result<TagSegmentHeader> {
        require_len(buf, offset, Self::SIZE_BYTES)?;
        let word = order.read_u32(&buf[offset..]);
        let tag = (word >> 20) as u16 & 0xFFF;
        let data_type_val = ((word >> 16) & 0xF) as u8;
        let length_words = (word & 0xFFFF) as u16;
        let data_type = DataType::from_value(data_type_val).ok_or_else(|| HipoError::MalformedHeader {
            offset: offset as u64,
            reason: format!("unknown tag-segment data type 0x{data_type_val:02X}"),
        })?;
        Ok(TagSegmentHeader {
            tag,
            data_type,
            length_words,
        })
    }

    pub fn encode_into(&self, buf: &mut [u8], order: ByteOrder) {
        let word = (((self.tag as u32) & 0xFFF) << 20) | (((self.data_type.to_value() as u32) & 0xF) << 16) | (self.length_words as u32);
        order.write_u32(buf, word);
    }

    pub fn encode(&self, order: ByteOrder) -> [u8; Self::SIZE_BYTES] {
        let mut buf = [0u8; Self::SIZE_BYTES];
        self.encode_into(&mut buf, order);
        buf
    }
}

fn require_len(buf: &[u8], offset: usize, needed: usize) -> Result<()> {
    if buf.len() < offset + needed {
        return Err(HipoError::TruncatedBuffer {
            offset,
            needed,
            available: buf.len().saturating_sub(offset),
        });
    }
    Ok(())
}

fn validate_padding(padding: u8, offset: usize) -> Result<()> {
    if padding > 3 {
        return Err(HipoError::MalformedHeader {
            offset: offset as u64,
            reason: format!("padding value {padding} out of range 0..3"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_header_round_trips() {
        let h = BankHeader {
            length_words: 4,
            tag: 0xABCD,
            data_type: DataType::Uint32,
            padding: 0,
            num: 7,
        };
        let bytes = h.encode(ByteOrder::Little);
        assert_eq!(BankHeader::decode(&bytes, 0, ByteOrder::Little).unwrap(), h);

        let bytes_be = h.encode(ByteOrder::Big);
        assert_eq!(BankHeader::decode(&bytes_be, 0, ByteOrder::Big).unwrap(), h);
    }

    #[test]
    fn bank_header_carries_padding_for_char_leaves() {
        let h = BankHeader {
            length_words: 2,
            tag: 1,
            data_type: DataType::UChar8,
            padding: 3,
            num: 0,
        };
        let bytes = h.encode(ByteOrder::Big);
        assert_eq!(BankHeader::decode(&bytes, 0, ByteOrder::Big).unwrap().padding, 3);
    }

    #[test]
    fn segment_header_round_trips() {
        let h = SegmentHeader {
            tag: 42,
            data_type: DataType::Short16,
            padding: 2,
            length_words: 1000,
        };
        let bytes = h.encode(ByteOrder::Little);
        assert_eq!(SegmentHeader::decode(&bytes, 0, ByteOrder::Little).unwrap(), h);
    }

    #[test]
    fn tag_segment_header_round_trips() {
        let h = TagSegmentHeader {
            tag: 0xABC,
            data_type: DataType::CharStar8,
            length_words: 3,
        };
        let bytes = h.encode(ByteOrder::Big);
        assert_eq!(TagSegmentHeader::decode(&bytes, 0, ByteOrder::Big).unwrap(), h);
    }

    #[test]
    fn truncated_bank_header_errors() {
        let buf = [0u8; 4];
        let err = BankHeader::decode(&buf, 0, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, HipoError::TruncatedBuffer { .. }));
    }
}
