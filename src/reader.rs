//! Opens a file or buffer written by [`crate::writer::Writer`]: decodes the
//! file header, locates every record (via the trailer index when present,
//! otherwise by sequential scan), and provides event access across the
//! whole file by a single global index.

use std::fs;
use std::path::Path;

use crate::byte_order::{pad, ByteOrder};
use crate::data_type::HeaderType;
use crate::error::{HipoError, Result};
use crate::header::file::FileHeader;
use crate::header::record::{RecordHeader, HEADER_SIZE_BYTES};
use crate::record::input::RecordInput;

struct RecordLocation {
    offset: usize,
    length: usize,
    entries: u32,
}

/// A fully-indexed file or buffer: every record's offset is known up front,
/// and a cumulative entry-count table lets event lookup by global index binary
/// search the owning record in O(log n), rather than scanning every record.
pub struct Reader {
    data: Vec<u8>,
    file_header: FileHeader,
    byte_order: ByteOrder,
    records: Vec<RecordLocation>,
    /// `cumulative_entries[i]` is the total event count across `records[0..=i]`.
    cumulative_entries: Vec<u32>,
}

impl Reader {
    pub fn open(path: impl AsRef<Path>) -> Result<Reader> {
        let data = fs::read(path.as_ref()).map_err(HipoError::Io)?;
        Reader::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Reader> {
        let file_header = FileHeader::decode(&data, 0, ByteOrder::Little)?;
        let order = file_header.byte_order();
        let user_header_len = file_header.user_header_length();
        let events_start = HEADER_SIZE_BYTES + user_header_len as usize + pad(user_header_len) as usize;

        let records = if file_header.trailer_position() != 0 {
            let trailer_pos = file_header.trailer_position() as usize;
            let trailer_header = RecordHeader::decode(&data, trailer_pos, order)?;
            if trailer_header.index_length > 0 {
                records_from_trailer_index(&data, &trailer_header, trailer_pos, events_start, order)?
            } else {
                scan_records(&data, events_start, order, trailer_pos)?
            }
        } else {
            scan_records(&data, events_start, order, data.len())?
        };

        log::debug!(
            "opened hipo reader: {} records, order={:?}, has_dictionary={}",
            records.len(),
            order,
            file_header.has_dictionary()
        );

        let cumulative_entries = {
            let mut sum = 0u32;
            records.iter().map(|r| { sum += r.entries; sum }).collect()
        };

        Ok(Reader {
            data,
            file_header,
            byte_order: order,
            records,
            cumulative_entries,
        })
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn get_record(&self, i: usize) -> Result<RecordInput> {
        let loc = self.records.get(i).ok_or(HipoError::IndexOutOfRange {
            index: i as u32,
            entries: self.records.len() as u32,
        })?;
        RecordInput::read_record(&self.data, loc.offset, self.byte_order)
    }

    /// Total number of events across every (non-trailer) record.
    pub fn event_count(&self) -> u32 {
        self.cumulative_entries.last().copied().unwrap_or(0)
    }

    /// Fetch event `global_index`, counting from 0 across the whole file.
    ///
    /// Binary searches `cumulative_entries` for the owning record rather than
    /// scanning every record in order.
    pub fn get_event(&self, global_index: u32) -> Result<Vec<u8>> {
        let i = self.cumulative_entries.partition_point(|&total| total <= global_index);
        if i >= self.records.len() {
            return Err(HipoError::IndexOutOfRange {
                index: global_index,
                entries: self.event_count(),
            });
        }
        let preceding = if i == 0 { 0 } else { self.cumulative_entries[i - 1] };
        let record = self.get_record(i)?;
        Ok(record.get_event(global_index - preceding)?.to_vec())
    }

    /// The user header bytes, minus whatever synthesized dictionary/first-
    /// event framing [`crate::writer::Writer`] wrapped them in.
    fn raw_user_header(&self) -> &[u8] {
        let len = self.file_header.user_header_length() as usize;
        &self.data[HEADER_SIZE_BYTES..HEADER_SIZE_BYTES + len]
    }

    /// Decode the dictionary XML from a writer-synthesized user header, if
    /// the file declares one. Returns `Ok(None)` if absent, and an error if
    /// `has_dictionary` is set but the user header is too short to hold the
    /// length-prefixed framing `Writer` emits.
    pub fn dictionary_xml(&self) -> Result<Option<String>> {
        if !self.file_header.has_dictionary() {
            return Ok(None);
        }
        let (dict, _) = decode_synthesized_user_header(self.raw_user_header(), self.byte_order)?;
        Ok(Some(String::from_utf8_lossy(dict).into_owned()))
    }

    /// Decode the first-event bytes from a writer-synthesized user header,
    /// if the file declares one.
    pub fn first_event(&self) -> Result<Option<Vec<u8>>> {
        if !self.file_header.has_first_event() {
            return Ok(None);
        }
        let (_, first_event) = decode_synthesized_user_header(self.raw_user_header(), self.byte_order)?;
        Ok(Some(first_event.to_vec()))
    }
}

fn decode_synthesized_user_header(bytes: &[u8], order: ByteOrder) -> Result<(&[u8], &[u8])> {
    if bytes.len() < 4 {
        return Err(HipoError::TruncatedBuffer {
            offset: 0,
            needed: 4,
            available: bytes.len(),
        });
    }
    let dict_len = order.read_u32(bytes) as usize;
    let dict_end = 4 + dict_len;
    if bytes.len() < dict_end + 4 {
        return Err(HipoError::TruncatedBuffer {
            offset: dict_end,
            needed: 4,
            available: bytes.len().saturating_sub(dict_end),
        });
    }
    let first_event_len = order.read_u32(&bytes[dict_end..]) as usize;
    let first_event_start = dict_end + 4;
    let first_event_end = first_event_start + first_event_len;
    if bytes.len() < first_event_end {
        return Err(HipoError::TruncatedBuffer {
            offset: first_event_start,
            needed: first_event_len,
            available: bytes.len().saturating_sub(first_event_start),
        });
    }
    Ok((&bytes[4..dict_end], &bytes[first_event_start..first_event_end]))
}

fn records_from_trailer_index(
    data: &[u8],
    trailer_header: &RecordHeader,
    trailer_pos: usize,
    events_start: usize,
    order: ByteOrder,
) -> Result<Vec<RecordLocation>> {
    let index_start = trailer_pos + HEADER_SIZE_BYTES;
    let pair_count = (trailer_header.index_length / 8) as usize;
    if data.len() < index_start + pair_count * 8 {
        return Err(HipoError::TruncatedBuffer {
            offset: index_start,
            needed: pair_count * 8,
            available: data.len().saturating_sub(index_start),
        });
    }

    let mut out = Vec::with_capacity(pair_count);
    let mut cursor = events_start;
    for i in 0..pair_count {
        let pair_offset = index_start + i * 8;
        let length = order.read_u32(&data[pair_offset..]) as usize;
        let entries = order.read_u32(&data[pair_offset + 4..]);
        out.push(RecordLocation {
            offset: cursor,
            length,
            entries,
        });
        cursor += length;
    }
    Ok(out)
}

/// Walk records sequentially from `pos` to `end`, decoding each header in
/// turn to find the next, stopping at the first trailer-typed header.
fn scan_records(data: &[u8], mut pos: usize, order: ByteOrder, end: usize) -> Result<Vec<RecordLocation>> {
    let mut out = Vec::new();
    while pos + HEADER_SIZE_BYTES <= end {
        let header = RecordHeader::decode(data, pos, order)?;
        if header.header_type == HeaderType::Trailer {
            break;
        }
        let length = header.record_length_bytes() as usize;
        out.push(RecordLocation {
            offset: pos,
            length,
            entries: header.entries,
        });
        pos += length;
    }
    Ok(out)
}
