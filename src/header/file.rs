//! File header: identical 14-word framing to [`super::record::RecordHeader`],
//! distinguished only by its `HeaderType` code and its repurposing of
//! `user_register_1` to hold the trailer's file position at close.

use crate::byte_order::ByteOrder;
use crate::data_type::HeaderType;
use crate::error::Result;
use crate::header::record::{RecordHeader, HEADER_SIZE_BYTES};

/// In-memory representation of a file header. Wraps a [`RecordHeader`]
/// rather than duplicating the 14-word codec; only the accessors below
/// give the shared fields file-specific meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    inner: RecordHeader,
}

impl Default for FileHeader {
    fn default() -> Self {
        let mut inner = RecordHeader::default();
        inner.header_type = HeaderType::HipoFile;
        FileHeader { inner }
    }
}

impl FileHeader {
    pub fn new() -> FileHeader {
        FileHeader::default()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.inner.byte_order
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.inner.byte_order = order;
    }

    pub fn header_type(&self) -> HeaderType {
        self.inner.header_type
    }

    /// Number of records written, tracked in the entry-count field.
    pub fn record_count(&self) -> u32 {
        self.inner.entries
    }

    pub fn set_record_count(&mut self, count: u32) {
        self.inner.entries = count;
    }

    pub fn user_header_length(&self) -> u32 {
        self.inner.user_header_length
    }

    pub fn set_user_header_length(&mut self, len: u32) {
        self.inner.user_header_length = len;
    }

    /// Absolute byte offset of the trailer record, written at close.
    /// Repurposes user register #1, which a plain record header leaves for
    /// caller-defined metadata.
    pub fn trailer_position(&self) -> u64 {
        self.inner.user_register_1
    }

    pub fn set_trailer_position(&mut self, position: u64) {
        self.inner.user_register_1 = position;
    }

    pub fn has_dictionary(&self) -> bool {
        self.inner.has_dictionary
    }

    pub fn set_has_dictionary(&mut self, value: bool) {
        self.inner.has_dictionary = value;
    }

    pub fn has_first_event(&self) -> bool {
        self.inner.has_first_event
    }

    pub fn set_has_first_event(&mut self, value: bool) {
        self.inner.has_first_event = value;
    }

    /// Set on close once a trailer record has been appended.
    pub fn has_trailer(&self) -> bool {
        self.inner.is_last_record
    }

    pub fn set_has_trailer(&mut self, value: bool) {
        self.inner.is_last_record = value;
    }

    pub fn record_number(&self) -> u32 {
        self.inner.record_number
    }

    pub fn set_record_number(&mut self, value: u32) {
        self.inner.record_number = value;
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE_BYTES] {
        self.inner.encode()
    }

    pub fn encode_into(&self, buf: &mut [u8]) {
        self.inner.encode_into(buf)
    }

    pub fn decode(buf: &[u8], offset: usize, assumed_order: ByteOrder) -> Result<FileHeader> {
        let inner = RecordHeader::decode(buf, offset, assumed_order)?;
        Ok(FileHeader { inner })
    }
}

impl std::fmt::Display for FileHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FileHeader {{ type: {:?}, order: {:?}, records: {}, trailer_position: {} }}",
            self.inner.header_type,
            self.inner.byte_order,
            self.inner.entries,
            self.trailer_position()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_header_round_trips() {
        let mut h = FileHeader::new();
        h.set_record_count(3);
        h.set_trailer_position(12345);
        h.set_has_dictionary(true);
        let bytes = h.encode();
        let decoded = FileHeader::decode(&bytes, 0, ByteOrder::Little).unwrap();
        assert_eq!(decoded, h);
        assert_eq!(decoded.trailer_position(), 12345);
    }
}
