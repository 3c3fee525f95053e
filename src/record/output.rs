//! Accumulates events into one record and serializes it: index, padded user
//! header and events, optionally compressed as a single `[index |
//! user-header | events]` region.

use crate::byte_order::{ceil_div4, pad, ByteOrder};
use crate::compression::{self, CompressionType};
use crate::error::{HipoError, Result};
use crate::header::record::RecordHeader;

/// Caps past which [`RecordOutput::add_event`] refuses further events,
/// forcing the caller to flush and start a new record.
#[derive(Debug, Clone, Copy)]
pub struct RecordOutputConfig {
    pub max_event_count: u32,
    pub max_buffer_size: u32,
}

impl Default for RecordOutputConfig {
    fn default() -> Self {
        RecordOutputConfig {
            max_event_count: 1_000_000,
            max_buffer_size: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordOutput {
    config: RecordOutputConfig,
    compression_type: CompressionType,
    byte_order: ByteOrder,
    events: Vec<Vec<u8>>,
    user_header: Vec<u8>,
    events_bytes: u32,
    last_compression_ratio: Option<f64>,
}

impl RecordOutput {
    pub fn new(compression_type: CompressionType, byte_order: ByteOrder) -> RecordOutput {
        RecordOutput::with_config(compression_type, byte_order, RecordOutputConfig::default())
    }

    pub fn with_config(compression_type: CompressionType, byte_order: ByteOrder, config: RecordOutputConfig) -> RecordOutput {
        RecordOutput {
            config,
            compression_type,
            byte_order,
            events: Vec::new(),
            user_header: Vec::new(),
            events_bytes: 0,
            last_compression_ratio: None,
        }
    }

    pub fn entries(&self) -> u32 {
        self.events.len() as u32
    }

    pub fn set_user_header(&mut self, bytes: &[u8]) {
        self.user_header = bytes.to_vec();
    }

    /// True once adding `event` would exceed either configured cap; callers
    /// use this to decide when to flush the current record and start a new
    /// one rather than calling [`Self::add_event`] and handling the error.
    pub fn would_overflow(&self, event: &[u8]) -> bool {
        self.events.len() as u32 + 1 > self.config.max_event_count
            || self.events_bytes as u64 + event.len() as u64 > self.config.max_buffer_size as u64
    }

    pub fn add_event(&mut self, event: &[u8]) -> Result<()> {
        if self.events.len() as u32 + 1 > self.config.max_event_count {
            return Err(HipoError::RecordCapacityExceeded {
                limit: self.config.max_event_count,
                attempted: self.events.len() as u32 + 1,
            });
        }
        let projected = self.events_bytes as u64 + event.len() as u64;
        if projected > self.config.max_buffer_size as u64 {
            return Err(HipoError::RecordCapacityExceeded {
                limit: self.config.max_buffer_size,
                attempted: projected as u32,
            });
        }
        self.events_bytes += event.len() as u32;
        self.events.push(event.to_vec());
        Ok(())
    }

    pub fn reset(&mut self) {
        self.events.clear();
        self.user_header.clear();
        self.events_bytes = 0;
        self.last_compression_ratio = None;
    }

    /// Ratio of uncompressed to compressed payload bytes from the most
    /// recent [`Self::build`] call, or `None` if no record has been built
    /// yet or the record was stored uncompressed.
    pub fn last_compression_ratio(&self) -> Option<f64> {
        self.last_compression_ratio
    }

    /// Serialize the accumulated events into one complete record, header
    /// included.
    pub fn build(&mut self, record_number: u32) -> Result<Vec<u8>> {
        let entries = self.events.len() as u32;
        let index_length = 4 * entries;

        let mut payload = Vec::with_capacity(index_length as usize + self.user_header.len() + self.events_bytes as usize);
        for event in &self.events {
            let mut tmp = [0u8; 4];
            self.byte_order.write_u32(&mut tmp, event.len() as u32);
            payload.extend_from_slice(&tmp);
        }
        payload.extend_from_slice(&self.user_header);
        payload.extend(std::iter::repeat(0u8).take(pad(self.user_header.len() as u32) as usize));
        for event in &self.events {
            payload.extend_from_slice(event);
        }
        payload.extend(std::iter::repeat(0u8).take(pad(self.events_bytes) as usize));

        let mut header = RecordHeader::new();
        header.byte_order = self.byte_order;
        header.record_number = record_number;
        header.entries = entries;
        header.index_length = index_length;
        header.user_header_length = self.user_header.len() as u32;
        header.uncompressed_data_length = self.events_bytes;
        header.compression_type = self.compression_type;

        let mut out = Vec::with_capacity(payload.len() + 56);
        match self.compression_type {
            CompressionType::Uncompressed => {
                header.set_compressed_data_length(0);
                header.record_length_words = header.header_length_words
                    + ceil_div4(index_length)
                    + header.user_header_length_words()
                    + header.data_length_words();
                self.last_compression_ratio = None;
                out.extend_from_slice(&header.encode());
                out.extend_from_slice(&payload);
            }
            kind => {
                let compressed = compression::compress(kind, &payload)?;
                log::trace!(
                    "compressed record #{record_number}: {} -> {} bytes ({kind:?})",
                    payload.len(),
                    compressed.len()
                );
                header.set_compressed_data_length(compressed.len() as u32);
                header.record_length_words = header.header_length_words + header.compressed_data_length_words;
                self.last_compression_ratio = if compressed.is_empty() {
                    None
                } else {
                    Some(payload.len() as f64 / compressed.len() as f64)
                };
                out.extend_from_slice(&header.encode());
                out.extend_from_slice(&compressed);
                let trailing_pad = header.compressed_data_length_words * 4 - compressed.len() as u32;
                out.extend(std::iter::repeat(0u8).take(trailing_pad as usize));
            }
        }
        Ok(out)
    }
}
