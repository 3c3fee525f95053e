//! Byte-order flip of one evio structure tree, recursing through structural
//! containers and swapping primitive leaves element-wise.
//!
//! Composite leaves are a special case: on the wire a composite bank is a
//! tag-segment carrying the format string (copied verbatim, it's char data)
//! immediately followed by a bank carrying the formatted payload, which is
//! swapped word-by-word under the compiled format program rather than by a
//! uniform element size.

use crate::byte_order::{swap16, swap32, swap64, ByteOrder};
use crate::composite;
use crate::data_type::DataType;
use crate::error::{HipoError, Result};
use crate::header::structure::{BankHeader, SegmentHeader, TagSegmentHeader};

/// Swap one structure (and, if it's a container, every descendant) in
/// place within `buf`. `kind` names the structure kind fronting `pos`.
/// Returns the total byte span swapped (header + data).
pub fn swap_structure_in_place(buf: &mut [u8], pos: usize, kind: DataType, order: ByteOrder) -> Result<usize> {
    match kind {
        DataType::Bank => swap_bank(buf, pos, order),
        DataType::Segment => swap_segment(buf, pos, order),
        DataType::TagSegment => swap_tagsegment(buf, pos, order),
        other => Err(HipoError::BadFormat {
            reason: format!("{other:?} is not a structure kind that can front a container"),
        }),
    }
}

/// Swap the top-level event (always a bank) at `pos` in a fresh copy of
/// `src`. Callers that already own a mutable buffer (e.g. a reader about to
/// discard the original bytes) should call [`swap_structure_in_place`]
/// directly instead of paying for this copy.
pub fn swap_event(src: &[u8], pos: usize, order: ByteOrder) -> Result<Vec<u8>> {
    let mut buf = src.to_vec();
    let swapped_bytes = swap_structure_in_place(&mut buf, pos, DataType::Bank, order)?;
    log::trace!("swapped event at offset {pos} ({swapped_bytes} bytes, declared order {order:?})");
    Ok(buf)
}

fn swap_bank(buf: &mut [u8], pos: usize, order: ByteOrder) -> Result<usize> {
    let h = BankHeader::decode(buf, pos, order)?;
    swap32(&mut buf[pos..pos + 4]);
    swap32(&mut buf[pos + 4..pos + 8]);
    let data_position = pos + BankHeader::SIZE_BYTES;
    let data_length = (h.length_words - 1) as usize * 4;
    swap_payload(buf, data_position, data_length, h.data_type, h.padding, order)?;
    Ok((data_position - pos) + data_length)
}

fn swap_segment(buf: &mut [u8], pos: usize, order: ByteOrder) -> Result<usize> {
    let h = SegmentHeader::decode(buf, pos, order)?;
    swap32(&mut buf[pos..pos + 4]);
    let data_position = pos + SegmentHeader::SIZE_BYTES;
    let data_length = h.length_words as usize * 4;
    swap_payload(buf, data_position, data_length, h.data_type, h.padding, order)?;
    Ok((data_position - pos) + data_length)
}

fn swap_tagsegment(buf: &mut [u8], pos: usize, order: ByteOrder) -> Result<usize> {
    let h = TagSegmentHeader::decode(buf, pos, order)?;
    swap32(&mut buf[pos..pos + 4]);
    let data_position = pos + TagSegmentHeader::SIZE_BYTES;
    let data_length = h.length_words as usize * 4;
    swap_payload(buf, data_position, data_length, h.data_type, 0, order)?;
    Ok((data_position - pos) + data_length)
}

fn swap_payload(buf: &mut [u8], pos: usize, len: usize, data_type: DataType, padding: u8, order: ByteOrder) -> Result<()> {
    if buf.len() < pos + len {
        return Err(HipoError::TruncatedBuffer {
            offset: pos,
            needed: len,
            available: buf.len().saturating_sub(pos),
        });
    }

    if data_type.is_structure() {
        let mut child_pos = pos;
        let end = pos + len;
        let min_header = match data_type {
            DataType::Bank => BankHeader::SIZE_BYTES,
            _ => SegmentHeader::SIZE_BYTES,
        };
        while child_pos + min_header <= end {
            let consumed = swap_structure_in_place(buf, child_pos, data_type, order)?;
            child_pos += consumed;
        }
        return Ok(());
    }

    match data_type {
        DataType::Composite => swap_composite(buf, pos, len, order),
        DataType::Unknown32 | DataType::CharStar8 | DataType::Char8 | DataType::UChar8 => Ok(()),
        _ => {
            let element_size = data_type.element_size().ok_or_else(|| HipoError::BadFormat {
                reason: format!("{data_type:?} has no uniform element size to swap"),
            })?;
            let usable = len.saturating_sub(padding as usize);
            let mut off = pos;
            let end = pos + usable;
            while off + element_size <= end {
                match element_size {
                    2 => swap16(&mut buf[off..off + 2]),
                    4 => swap32(&mut buf[off..off + 4]),
                    8 => swap64(&mut buf[off..off + 8]),
                    _ => unreachable!("DataType::element_size only returns 2, 4, or 8"),
                }
                off += element_size;
            }
            Ok(())
        }
    }
}

/// Swap a composite leaf: a tag-segment holding the (unswapped) format
/// string immediately followed by a bank holding the formatted payload.
fn swap_composite(buf: &mut [u8], pos: usize, len: usize, order: ByteOrder) -> Result<()> {
    let fmt_header = TagSegmentHeader::decode(buf, pos, order)?;
    swap32(&mut buf[pos..pos + 4]);
    let fmt_data_pos = pos + TagSegmentHeader::SIZE_BYTES;
    let fmt_len = fmt_header.length_words as usize * 4;
    let format_string = decode_format_string(&buf[fmt_data_pos..fmt_data_pos + fmt_len]);
    let program = composite::compile(&format_string)?;

    let bank_pos = fmt_data_pos + fmt_len;
    let bank_header = BankHeader::decode(buf, bank_pos, order)?;
    swap32(&mut buf[bank_pos..bank_pos + 4]);
    swap32(&mut buf[bank_pos + 4..bank_pos + 8]);
    let bank_data_pos = bank_pos + BankHeader::SIZE_BYTES;
    let bank_data_len = (bank_header.length_words - 1) as usize * 4;

    let expected_end = pos + len;
    let actual_end = bank_data_pos + bank_data_len;
    if actual_end != expected_end {
        return Err(HipoError::MalformedHeader {
            offset: pos as u64,
            reason: format!("composite leaf ended at byte {actual_end}, container declared end at {expected_end}"),
        });
    }

    composite::interp::swap_in_place(buf, bank_data_pos, bank_data_len, &program, order)
}

fn decode_format_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
