//! Decodes one record from a byte source: resolves the header, decompresses
//! the `[index | user-header | events]` region, and materializes an O(1)
//! event-offset index, reconstructing it by scanning evio bank lengths when
//! the record was written without one.

use crate::byte_order::{ceil_div4, ByteOrder};
use crate::compression::{self, CompressionType};
use crate::error::{HipoError, Result};
use crate::header::record::{RecordHeader, HEADER_SIZE_BYTES};

/// A decoded record: the header, the decompressed `[index | user-header |
/// events]` region, and the materialized cumulative-end-offset index.
#[derive(Debug, Clone)]
pub struct RecordInput {
    header: RecordHeader,
    data: Vec<u8>,
    index: Vec<u32>,
    user_header_offset: usize,
    events_offset: usize,
}

impl RecordInput {
    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    pub fn entries(&self) -> u32 {
        self.header.entries
    }

    /// Read and fully decode one record starting at `offset` in `source`.
    /// `assumed_order` is tried first for magic-word detection; see
    /// [`RecordHeader::decode`].
    pub fn read_record(source: &[u8], offset: usize, assumed_order: ByteOrder) -> Result<RecordInput> {
        let header = RecordHeader::decode(source, offset, assumed_order)?;
        let order = header.byte_order;
        let entries = header.entries;

        if header.index_length != 0 && header.index_length != 4 * entries {
            return Err(HipoError::InconsistentHeader {
                offset: offset as u64,
                index_length: header.index_length,
                entries,
            });
        }
        let reconstruct = header.index_length == 0 && entries > 0;
        let effective_index_length = if reconstruct { 4 * entries } else { header.index_length };

        let padded_user_header_len = header.user_header_length + header.user_header_length_padding();

        let user_header_offset = effective_index_length as usize;
        let events_offset = user_header_offset + padded_user_header_len as usize;

        // `region` is the raw on-disk `[index | userHeader | events]` bytes,
        // decompressed but otherwise untouched: if there's no index on disk
        // (`reconstruct`), it starts directly at the user header.
        let region = decompress_region(source, offset, &header)?;

        let total_len = if reconstruct { user_header_offset + region.len() } else { region.len() };
        let dest_start = if reconstruct { user_header_offset } else { 0 };

        let mut data = vec![0u8; total_len];
        data[dest_start..dest_start + region.len()].copy_from_slice(&region);

        let index = if reconstruct {
            log::debug!("record at offset {offset} has no index; reconstructing from {entries} evio bank lengths");
            reconstruct_index(&data, events_offset, entries, order)?
        } else {
            rewrite_lengths_to_offsets(&mut data, entries, order)
        };

        Ok(RecordInput {
            header,
            data,
            index,
            user_header_offset,
            events_offset,
        })
    }

    /// `O(1)`: byte range of event `i`, relative to the start of the events
    /// region.
    fn event_range(&self, i: u32) -> Result<(usize, usize)> {
        if i >= self.header.entries {
            return Err(HipoError::IndexOutOfRange {
                index: i,
                entries: self.header.entries,
            });
        }
        let start = if i == 0 { 0 } else { self.index[i as usize - 1] as usize };
        let end = self.index[i as usize] as usize;
        Ok((start, end))
    }

    pub fn get_event_length(&self, i: u32) -> Result<u32> {
        let (start, end) = self.event_range(i)?;
        Ok((end - start) as u32)
    }

    pub fn get_event(&self, i: u32) -> Result<&[u8]> {
        let (start, end) = self.event_range(i)?;
        Ok(&self.data[self.events_offset + start..self.events_offset + end])
    }

    pub fn get_user_header(&self) -> &[u8] {
        &self.data[self.user_header_offset..self.user_header_offset + self.header.user_header_length as usize]
    }

    /// Iterate all events in the record in order.
    pub fn events(&self) -> impl Iterator<Item = Result<&[u8]>> {
        (0..self.header.entries).map(move |i| self.get_event(i))
    }

    /// Write `header`'s record, decompressed, into `dst` starting at byte 0:
    /// the header verbatim except with compression cleared and lengths
    /// recomputed for the now-uncompressed layout, followed by the
    /// uncompressed `[index | user-header | events]` bytes. Returns the byte
    /// offset of the events region within `dst`.
    pub fn uncompress_record(src: &[u8], src_off: usize, dst: &mut Vec<u8>, header: &RecordHeader) -> Result<usize> {
        // Raw on-disk `[index | userHeader | events]` bytes, decompressed but
        // otherwise untouched: whatever index layout was on disk (including
        // none, when `header.index_length == 0`) is preserved verbatim.
        let region = decompress_region(src, src_off, header)?;

        let mut new_header = *header;
        new_header.compression_type = CompressionType::Uncompressed;
        new_header.set_compressed_data_length(0);
        new_header.record_length_words = new_header.header_length_words
            + ceil_div4(header.index_length)
            + new_header.user_header_length_words()
            + new_header.data_length_words();

        dst.clear();
        dst.extend_from_slice(&new_header.encode());
        dst.extend_from_slice(&region);

        let padded_user_header_len = header.user_header_length + header.user_header_length_padding();
        let events_offset = header.index_length as usize + padded_user_header_len as usize;
        Ok(HEADER_SIZE_BYTES + events_offset)
    }
}

/// Decompress one record's `[index | userHeader | events]` region, exactly
/// as laid out on disk (no index reconstruction or length-to-offset
/// rewriting): `header.index_length` bytes of index, then the padded user
/// header, then the padded events.
fn decompress_region(source: &[u8], offset: usize, header: &RecordHeader) -> Result<Vec<u8>> {
    let padded_user_header_len = header.user_header_length + header.user_header_length_padding();
    let padded_data_len = header.uncompressed_data_length + header.data_length_padding();
    let disk_region_len = header.index_length as usize + padded_user_header_len as usize + padded_data_len as usize;

    let header_end = offset + HEADER_SIZE_BYTES;
    let mut region = vec![0u8; disk_region_len];
    match header.compression_type {
        CompressionType::Uncompressed => {
            let src = get_slice(source, header_end, disk_region_len)?;
            region.copy_from_slice(src);
        }
        kind => {
            let compressed_len = header.compressed_data_length_bytes() as usize;
            let src = get_slice(source, header_end, compressed_len)?;
            let written = compression::decompress_into(kind, src, &mut region)?;
            if written != disk_region_len {
                return Err(HipoError::MalformedHeader {
                    offset: offset as u64,
                    reason: format!("decompressed {written} bytes, expected {disk_region_len}"),
                });
            }
        }
    }
    Ok(region)
}

fn get_slice(source: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    if source.len() < offset + len {
        return Err(HipoError::TruncatedBuffer {
            offset,
            needed: len,
            available: source.len().saturating_sub(offset),
        });
    }
    Ok(&source[offset..offset + len])
}

/// Convert the first `4 * entries` bytes of `data` from per-event lengths
/// (bytes) into cumulative end offsets relative to the events region.
fn rewrite_lengths_to_offsets(data: &mut [u8], entries: u32, order: ByteOrder) -> Vec<u32> {
    let mut cumulative = 0u32;
    let mut index = Vec::with_capacity(entries as usize);
    for i in 0..entries {
        let off = (i * 4) as usize;
        let len = order.read_u32(&data[off..]);
        cumulative += len;
        order.write_u32(&mut data[off..], cumulative);
        index.push(cumulative);
    }
    index
}

/// Synthesize the index by scanning `entries` top-level evio banks starting
/// at `events_offset`: each bank's first word (minus 1) gives its length in
/// words, excluding that length word itself.
fn reconstruct_index(data: &[u8], events_offset: usize, entries: u32, order: ByteOrder) -> Result<Vec<u32>> {
    let mut index = Vec::with_capacity(entries as usize);
    let mut read_pos = events_offset;
    let mut cumulative = 0u32;
    for _ in 0..entries {
        if read_pos + 4 > data.len() {
            return Err(HipoError::TruncatedBuffer {
                offset: read_pos,
                needed: 4,
                available: data.len().saturating_sub(read_pos),
            });
        }
        let length_word = order.read_u32(&data[read_pos..]);
        let event_len_bytes = 4 * (length_word + 1);
        read_pos += event_len_bytes as usize;
        cumulative += event_len_bytes;
        index.push(cumulative);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::output::RecordOutput;

    #[test]
    fn reads_back_a_simple_uncompressed_record() {
        let mut out = RecordOutput::new(CompressionType::Uncompressed, ByteOrder::Little);
        out.add_event(&[1, 2, 3, 4]).unwrap();
        out.add_event(&[5, 6, 7, 8, 9, 10, 11, 12]).unwrap();
        let bytes = out.build(1).unwrap();

        let input = RecordInput::read_record(&bytes, 0, ByteOrder::Little).unwrap();
        assert_eq!(input.entries(), 2);
        assert_eq!(input.get_event(0).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(input.get_event(1).unwrap(), &[5, 6, 7, 8, 9, 10, 11, 12]);
        assert!(input.get_event(2).is_err());
    }

    #[test]
    fn reads_back_a_compressed_record() {
        let mut out = RecordOutput::new(CompressionType::Lz4, ByteOrder::Little);
        out.add_event(&[9u8; 64]).unwrap();
        let bytes = out.build(1).unwrap();

        let input = RecordInput::read_record(&bytes, 0, ByteOrder::Little).unwrap();
        assert_eq!(input.get_event(0).unwrap(), &[9u8; 64]);
    }

    #[test]
    fn index_reconstruction_scans_evio_bank_lengths() {
        // Two top-level "banks": length words 2 and 4 (excluding the length
        // word itself), i.e. total word counts of 3 and 5.
        let order = ByteOrder::Little;
        let mut events = Vec::new();
        order_push_u32(&mut events, 2, order);
        events.extend_from_slice(&[0u8; 8]);
        order_push_u32(&mut events, 4, order);
        events.extend_from_slice(&[0u8; 16]);

        let mut header = RecordHeader::new();
        header.byte_order = order;
        header.entries = 2;
        header.index_length = 0;
        header.uncompressed_data_length = events.len() as u32;
        header.record_length_words = (HEADER_SIZE_BYTES as u32 + events.len() as u32) / 4;
        header.header_length_words = HEADER_SIZE_BYTES as u32 / 4;

        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(&events);

        let input = RecordInput::read_record(&bytes, 0, order).unwrap();
        assert_eq!(input.get_event_length(0).unwrap(), 12);
        assert_eq!(input.get_event_length(1).unwrap(), 20);
    }

    fn order_push_u32(buf: &mut Vec<u8>, v: u32, order: ByteOrder) {
        let mut tmp = [0u8; 4];
        order.write_u32(&mut tmp, v);
        buf.extend_from_slice(&tmp);
    }

    #[test]
    fn uncompress_record_round_trips_a_compressed_record_with_index() {
        let order = ByteOrder::Little;
        let mut out = RecordOutput::new(CompressionType::Lz4, order);
        out.add_event(&[1, 2, 3, 4]).unwrap();
        out.add_event(&[5, 6, 7, 8, 9, 10, 11, 12]).unwrap();
        let compressed_bytes = out.build(1).unwrap();
        let header = RecordHeader::decode(&compressed_bytes, 0, order).unwrap();

        let mut uncompressed = Vec::new();
        RecordInput::uncompress_record(&compressed_bytes, 0, &mut uncompressed, &header).unwrap();

        let new_header = RecordHeader::decode(&uncompressed, 0, order).unwrap();
        assert_eq!(new_header.compression_type, CompressionType::Uncompressed);
        assert_eq!(new_header.index_length, header.index_length);

        let input = RecordInput::read_record(&uncompressed, 0, order).unwrap();
        assert_eq!(input.get_event(0).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(input.get_event(1).unwrap(), &[5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn uncompress_record_preserves_a_missing_index() {
        let order = ByteOrder::Little;
        // Two bank-shaped "events" with no index on disk, compressed.
        let mut events = Vec::new();
        order_push_u32(&mut events, 2, order);
        events.extend_from_slice(&[0u8; 8]);
        order_push_u32(&mut events, 4, order);
        events.extend_from_slice(&[0u8; 16]);

        let compressed = compression::compress(CompressionType::Lz4, &events).unwrap();

        let mut header = RecordHeader::new();
        header.byte_order = order;
        header.entries = 2;
        header.index_length = 0;
        header.compression_type = CompressionType::Lz4;
        header.uncompressed_data_length = events.len() as u32;
        header.set_compressed_data_length(compressed.len() as u32);
        header.record_length_words = header.header_length_words + header.compressed_data_length_words;

        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(&compressed);
        let trailing_pad = header.compressed_data_length_words * 4 - compressed.len() as u32;
        bytes.extend(std::iter::repeat(0u8).take(trailing_pad as usize));

        let mut uncompressed = Vec::new();
        RecordInput::uncompress_record(&bytes, 0, &mut uncompressed, &header).unwrap();

        let new_header = RecordHeader::decode(&uncompressed, 0, order).unwrap();
        assert_eq!(new_header.compression_type, CompressionType::Uncompressed);
        assert_eq!(new_header.index_length, 0);

        // Missing index is reconstructed the same way on re-read.
        let input = RecordInput::read_record(&uncompressed, 0, order).unwrap();
        assert_eq!(input.get_event_length(0).unwrap(), 12);
        assert_eq!(input.get_event_length(1).unwrap(), 20);
    }
}
