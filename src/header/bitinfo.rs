//! Packing/unpacking of the 6th header word (bits 0-31), shared by
//! [`super::record::RecordHeader`] and [`super::file::FileHeader`] since both
//! reuse the identical 14-word framing.

use crate::data_type::{EventType, HeaderType};

pub const VERSION_MASK: u32 = 0xFF;
pub const DICTIONARY_BIT: u32 = 0x100;
pub const FIRST_EVENT_BIT: u32 = 0x200;
pub const LAST_RECORD_BIT: u32 = 0x400;
pub const EVENT_TYPE_SHIFT: u32 = 11;
pub const EVENT_TYPE_MASK: u32 = 0xF << EVENT_TYPE_SHIFT;
pub const USER_PADDING_SHIFT: u32 = 20;
pub const DATA_PADDING_SHIFT: u32 = 22;
pub const COMP_PADDING_SHIFT: u32 = 24;
pub const PADDING_FIELD_MASK: u32 = 0x3;
pub const HEADER_TYPE_SHIFT: u32 = 28;
pub const HEADER_TYPE_MASK: u32 = 0xF << HEADER_TYPE_SHIFT;

/// Lowest supported format version. Decoding a header whose version is
/// lower fails with `UnsupportedVersion`.
pub const MIN_SUPPORTED_VERSION: u32 = 6;
/// Version this crate writes.
pub const CURRENT_VERSION: u32 = 6;

/// Decoded contents of the bit-info word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitInfo {
    pub version: u32,
    pub has_dictionary: bool,
    pub has_first_event: bool,
    pub is_last_record: bool,
    pub event_type: EventType,
    pub user_header_padding: u32,
    pub data_padding: u32,
    pub compressed_data_padding: u32,
    pub header_type: HeaderType,
}

impl BitInfo {
    pub fn decode(word: u32) -> BitInfo {
        BitInfo {
            version: word & VERSION_MASK,
            has_dictionary: word & DICTIONARY_BIT != 0,
            has_first_event: word & FIRST_EVENT_BIT != 0,
            is_last_record: word & LAST_RECORD_BIT != 0,
            event_type: EventType::from_value(((word & EVENT_TYPE_MASK) >> EVENT_TYPE_SHIFT) as u8),
            user_header_padding: (word >> USER_PADDING_SHIFT) & PADDING_FIELD_MASK,
            data_padding: (word >> DATA_PADDING_SHIFT) & PADDING_FIELD_MASK,
            compressed_data_padding: (word >> COMP_PADDING_SHIFT) & PADDING_FIELD_MASK,
            header_type: HeaderType::from_value(((word & HEADER_TYPE_MASK) >> HEADER_TYPE_SHIFT) as u8)
                .unwrap_or(HeaderType::HipoRecord),
        }
    }

    pub fn encode(self) -> u32 {
        (self.version & VERSION_MASK)
            | if self.has_dictionary { DICTIONARY_BIT } else { 0 }
            | if self.has_first_event { FIRST_EVENT_BIT } else { 0 }
            | if self.is_last_record { LAST_RECORD_BIT } else { 0 }
            | ((self.event_type.to_value() as u32) << EVENT_TYPE_SHIFT)
            | ((self.user_header_padding & PADDING_FIELD_MASK) << USER_PADDING_SHIFT)
            | ((self.data_padding & PADDING_FIELD_MASK) << DATA_PADDING_SHIFT)
            | ((self.compressed_data_padding & PADDING_FIELD_MASK) << COMP_PADDING_SHIFT)
            | ((self.header_type.to_value() as u32) << HEADER_TYPE_SHIFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_info_round_trips() {
        let info = BitInfo {
            version: 6,
            has_dictionary: true,
            has_first_event: false,
            is_last_record: true,
            event_type: EventType::Physics,
            user_header_padding: 3,
            data_padding: 1,
            compressed_data_padding: 2,
            header_type: HeaderType::HipoRecord,
        };
        let word = info.encode();
        assert_eq!(BitInfo::decode(word), info);
    }

    #[test]
    fn default_bits_decode_to_hipo_record() {
        let info = BitInfo::decode(6);
        assert_eq!(info.version, 6);
        assert!(!info.has_dictionary);
        assert!(!info.is_last_record);
        assert_eq!(info.header_type, HeaderType::HipoRecord);
    }
}
