//! `CompositeData`: a format string plus a compiled bytecode program plus
//! the raw payload bytes it describes, bundled so a caller can swap, parse,
//! or rebuild the payload without recompiling the format each time.

use std::fmt;

use crate::byte_order::ByteOrder;
use crate::composite::format::{self, AtomKind, Program, RepeatSource};
use crate::composite::interp::{self, Machine};
use crate::error::{HipoError, Result};

/// One decoded value out of a composite payload. Strings are collected
/// separately from the numeric stream since `CHARSTAR8`/`CHAR8` runs are
/// variable-length raw bytes, not single scalar values.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositeItem {
    I32(i32),
    U32(u32),
    I16(i16),
    U16(u16),
    I8(i8),
    U8(u8),
    F32(f32),
    F64(f64),
    I64(i64),
    U64(u64),
    Bytes(Vec<u8>),
}

/// A compiled composite-data payload: the format string that produced the
/// bytecode, the bytecode itself, the raw bytes it describes, and the byte
/// order those bytes are currently in.
#[derive(Debug, Clone)]
pub struct CompositeData {
    pub format_string: String,
    pub program: Program,
    pub data_tag: u16,
    pub data_num: u8,
    pub format_tag: u16,
    pub payload: Vec<u8>,
    pub byte_order: ByteOrder,
}

impl CompositeData {
    pub fn new(format_string: &str, data_tag: u16, data_num: u8, format_tag: u16, payload: Vec<u8>, byte_order: ByteOrder) -> Result<CompositeData> {
        let program = format::compile(format_string)?;
        Ok(CompositeData {
            format_string: format_string.to_string(),
            program,
            data_tag,
            data_num,
            format_tag,
            payload,
            byte_order,
        })
    }

    /// Swap the payload in place and flip the recorded byte order.
    pub fn swap(&mut self) -> Result<()> {
        let len = self.payload.len();
        interp::swap_in_place(&mut self.payload, 0, len, &self.program, self.byte_order)?;
        self.byte_order = self.byte_order.opposite();
        Ok(())
    }

    pub fn parse(&self) -> Result<Vec<CompositeItem>> {
        parse(&self.payload, &self.program, self.byte_order)
    }
}

/// Decode `payload` according to `program`, producing the list of scalar
/// and byte-run values it describes, in encounter order.
pub fn parse(payload: &[u8], program: &[u16], order: ByteOrder) -> Result<Vec<CompositeItem>> {
    let mut out = Vec::new();
    let mut machine = Machine::new(program)?;
    let mut pos = 0usize;
    let end = payload.len();

    while pos < end {
        let step = machine.next(|source| {
            let width = source.data_bytes();
            require(payload, pos, width)?;
            let value = read_count(&payload[pos..], source, order);
            pos += width;
            Ok(value)
        })?;

        let size = step.kind.element_size();
        let max_elems = if size == 0 { 0 } else { (end - pos) / size };
        let n = (step.repeat as usize).min(max_elems);

        if step.kind.is_byte_copy() {
            out.push(CompositeItem::Bytes(payload[pos..pos + n].to_vec()));
            pos += n;
            continue;
        }

        for i in 0..n {
            let off = pos + i * size;
            out.push(decode_item(step.kind, &payload[off..off + size], order));
        }
        pos += n * size;
    }
    Ok(out)
}

/// Re-encode `items` according to `program`, producing bytes in `order`.
/// Inverse of [`parse`] for data that actually matches the format.
pub fn build(items: &[CompositeItem], program: &[u16], order: ByteOrder) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut machine = Machine::new(program)?;
    let mut idx = 0usize;

    while idx < items.len() {
        let step = machine.next(|source| {
            let value = next_count(items, &mut idx)?;
            write_count(&mut out, value, source, order);
            Ok(value)
        })?;

        if step.kind.is_byte_copy() {
            let bytes = match items.get(idx) {
                Some(CompositeItem::Bytes(b)) => b.clone(),
                _ => {
                    return Err(HipoError::BadFormat {
                        reason: "expected a byte run for a CHAR-family atom".to_string(),
                    })
                }
            };
            idx += 1;
            out.extend_from_slice(&bytes);
            continue;
        }

        for _ in 0..step.repeat {
            if idx >= items.len() {
                break;
            }
            write_item(&mut out, &items[idx], order)?;
            idx += 1;
        }
    }
    Ok(out)
}

fn next_count(items: &[CompositeItem], idx: &mut usize) -> Result<u32> {
    let value = match items.get(*idx) {
        Some(CompositeItem::I32(v)) => *v as u32,
        Some(CompositeItem::U32(v)) => *v,
        Some(CompositeItem::I16(v)) => *v as u32,
        Some(CompositeItem::U16(v)) => *v as u32,
        Some(CompositeItem::I8(v)) => *v as u32,
        Some(CompositeItem::U8(v)) => *v as u32,
        _ => {
            return Err(HipoError::BadFormat {
                reason: "expected an integer repeat count".to_string(),
            })
        }
    };
    *idx += 1;
    Ok(value)
}

fn write_count(out: &mut Vec<u8>, value: u32, source: RepeatSource, order: ByteOrder) {
    let mut buf = [0u8; 4];
    match source {
        RepeatSource::DataI32 => {
            order.write_u32(&mut buf, value);
            out.extend_from_slice(&buf[..4]);
        }
        RepeatSource::DataI16 => {
            order.write_u16(&mut buf, value as u16);
            out.extend_from_slice(&buf[..2]);
        }
        RepeatSource::DataI8 => out.push(value as u8),
        RepeatSource::Literal => {}
    }
}

fn require(buf: &[u8], pos: usize, needed: usize) -> Result<()> {
    if pos + needed > buf.len() {
        return Err(HipoError::TruncatedBuffer {
            offset: pos,
            needed,
            available: buf.len().saturating_sub(pos),
        });
    }
    Ok(())
}

fn read_count(buf: &[u8], source: RepeatSource, order: ByteOrder) -> u32 {
    match source {
        RepeatSource::DataI32 => order.read_u32(buf),
        RepeatSource::DataI16 => order.read_u16(buf) as u32,
        RepeatSource::DataI8 => buf[0] as u32,
        RepeatSource::Literal => 0,
    }
}

fn decode_item(kind: AtomKind, bytes: &[u8], order: ByteOrder) -> CompositeItem {
    match kind {
        AtomKind::Uint32 => CompositeItem::U32(order.read_u32(bytes)),
        AtomKind::Int32 => CompositeItem::I32(order.read_u32(bytes) as i32),
        AtomKind::Hollerit => CompositeItem::U32(order.read_u32(bytes)),
        AtomKind::Float32 => CompositeItem::F32(f32::from_bits(order.read_u32(bytes))),
        AtomKind::Short16 => CompositeItem::I16(order.read_u16(bytes) as i16),
        AtomKind::UShort16 => CompositeItem::U16(order.read_u16(bytes)),
        AtomKind::Double64 => CompositeItem::F64(f64::from_bits(order.read_u64(bytes))),
        AtomKind::Long64 => CompositeItem::I64(order.read_u64(bytes) as i64),
        AtomKind::ULong64 => CompositeItem::U64(order.read_u64(bytes)),
        AtomKind::Char8 | AtomKind::CharArray8 | AtomKind::UCharArray8 => CompositeItem::U8(bytes[0]),
    }
}

fn write_item(out: &mut Vec<u8>, item: &CompositeItem, order: ByteOrder) -> Result<()> {
    let mut buf = [0u8; 8];
    match item {
        CompositeItem::U32(v) => {
            order.write_u32(&mut buf, *v);
            out.extend_from_slice(&buf[..4]);
        }
        CompositeItem::I32(v) => {
            order.write_u32(&mut buf, *v as u32);
            out.extend_from_slice(&buf[..4]);
        }
        CompositeItem::F32(v) => {
            order.write_u32(&mut buf, v.to_bits());
            out.extend_from_slice(&buf[..4]);
        }
        CompositeItem::I16(v) => {
            order.write_u16(&mut buf, *v as u16);
            out.extend_from_slice(&buf[..2]);
        }
        CompositeItem::U16(v) => {
            order.write_u16(&mut buf, *v);
            out.extend_from_slice(&buf[..2]);
        }
        CompositeItem::F64(v) => {
            order.write_u64(&mut buf, v.to_bits());
            out.extend_from_slice(&buf[..8]);
        }
        CompositeItem::I64(v) => {
            order.write_u64(&mut buf, *v as u64);
            out.extend_from_slice(&buf[..8]);
        }
        CompositeItem::U64(v) => {
            order.write_u64(&mut buf, *v);
            out.extend_from_slice(&buf[..8]);
        }
        CompositeItem::I8(v) => out.push(*v as u8),
        CompositeItem::U8(v) => out.push(*v),
        CompositeItem::Bytes(b) => out.extend_from_slice(b),
    }
    Ok(())
}

impl fmt::Display for CompositeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CompositeData: format=\"{}\" tag={} num={}", self.format_string, self.data_tag, self.data_num)?;
        writeln!(f, "  program: {:?}", self.program)?;
        write!(f, "  payload: {} bytes, {:?}", self.payload.len(), self.byte_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_then_parse_round_trips() {
        let program = format::compile("N(I,F)").unwrap();
        let items = vec![
            CompositeItem::U32(2),
            CompositeItem::I32(1),
            CompositeItem::F32(1.0),
            CompositeItem::I32(2),
            CompositeItem::F32(2.0),
        ];
        let bytes = build(&items, &program, ByteOrder::Little).unwrap();
        let parsed = parse(&bytes, &program, ByteOrder::Little).unwrap();
        assert_eq!(parsed, items);
    }

    #[test]
    fn composite_data_swap_round_trips() {
        let mut cd = CompositeData::new(
            "N(I,F)",
            5,
            0,
            6,
            {
                let items = vec![
                    CompositeItem::U32(1),
                    CompositeItem::I32(7),
                    CompositeItem::F32(3.5),
                ];
                build(&items, &format::compile("N(I,F)").unwrap(), ByteOrder::Little).unwrap()
            },
            ByteOrder::Little,
        )
        .unwrap();
        let original = cd.payload.clone();
        cd.swap().unwrap();
        assert_ne!(cd.payload, original);
        assert_eq!(cd.byte_order, ByteOrder::Big);
        cd.swap().unwrap();
        assert_eq!(cd.payload, original);
        assert_eq!(cd.byte_order, ByteOrder::Little);
    }
}
