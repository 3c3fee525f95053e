//! Stack-based state machine that drives a compiled format program
//! ([`super::format::compile`]) over data: swapping it in place, parsing it
//! into a typed value list, or building it from one.
//!
//! The control-flow core (`Machine`) is shared by all three operations; only
//! how a resolved repeat count is obtained, and what happens to the `n`
//! elements of a primitive atom once reached, differs per caller.

use crate::byte_order::{swap16, swap32, swap64, ByteOrder};
use crate::composite::format::{Atom, AtomKind, RepeatSource};
use crate::error::{HipoError, Result};

const MAX_FRAMES: usize = 10;
/// Sentinel repeat count meaning "consume whatever data remains", set when
/// execution reaches the sole atom of the outermost still-open group at the
/// very end of the program — a configuration only reachable while a format
/// is replayed mid-group on the last pass over the data.
const CONSUME_REMAINDER: u32 = 999_999_999;

#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    left_pc: usize,
    n_repeat: u32,
    i_repeat: u32,
}

/// One resolved instruction ready to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub kind: AtomKind,
    pub repeat: u32,
}

/// Walks `program`, resolving `(`/`)` bookkeeping internally and handing
/// back each primitive atom with its repeat count resolved.
pub struct Machine<'p> {
    program: &'p [u16],
    pc: usize,
    frames: [Frame; MAX_FRAMES],
    lev: usize,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p [u16]) -> Result<Machine<'p>> {
        if program.is_empty() {
            return Err(HipoError::BadFormat {
                reason: "empty format program".to_string(),
            });
        }
        Ok(Machine {
            program,
            pc: 0,
            frames: [Frame::default(); MAX_FRAMES],
            lev: 0,
        })
    }

    /// Advance to the next primitive atom to execute, resolving `(`/`)`
    /// bookkeeping along the way. `read_repeat` is called exactly when a
    /// data-driven repeat count must be pulled from the data stream; it
    /// receives the source width and returns the resolved count.
    pub fn next(&mut self, mut read_repeat: impl FnMut(RepeatSource) -> Result<u32>) -> Result<Step> {
        loop {
            if self.pc >= self.program.len() {
                self.pc = 0;
            }
            match Atom::decode(self.program[self.pc]) {
                Atom::RParen => {
                    if self.lev == 0 {
                        return Err(HipoError::BadFormat {
                            reason: "unmatched ')' at runtime".to_string(),
                        });
                    }
                    self.frames[self.lev - 1].i_repeat += 1;
                    if self.frames[self.lev - 1].i_repeat >= self.frames[self.lev - 1].n_repeat {
                        self.lev -= 1;
                        self.pc += 1;
                    } else {
                        self.pc = self.frames[self.lev - 1].left_pc + 1;
                    }
                }
                Atom::LParen { repeat, source } => {
                    let n_repeat = if source == RepeatSource::Literal {
                        repeat as u32
                    } else {
                        read_repeat(source)?
                    };
                    // A data-driven repeat of 0 executes the group zero
                    // times: jump straight past the matching ')' without
                    // ever pushing a frame or touching the body's data.
                    if n_repeat == 0 {
                        let target = find_matching_rparen(self.program, self.pc + 1)? + 1;
                        if target >= self.program.len() {
                            // Landed back at the top of a repeating format
                            // with nothing left to resolve in this call;
                            // hand control back to the caller so it can
                            // stop cleanly if the data is exhausted rather
                            // than reading a repeat count past the end.
                            self.pc = 0;
                            return Ok(Step {
                                kind: AtomKind::Uint32,
                                repeat: 0,
                            });
                        }
                        self.pc = target;
                        continue;
                    }
                    if self.lev >= MAX_FRAMES {
                        return Err(HipoError::BadFormat {
                            reason: "composite format nesting exceeds 10 frames".to_string(),
                        });
                    }
                    self.frames[self.lev] = Frame {
                        left_pc: self.pc,
                        n_repeat,
                        i_repeat: 0,
                    };
                    self.lev += 1;
                    self.pc += 1;
                }
                Atom::Primitive { kind, repeat, source } => {
                    let mut n = if source == RepeatSource::Literal {
                        repeat as u32
                    } else {
                        read_repeat(source)?
                    };
                    let is_tail = self.lev > 0
                        && self.pc == self.program.len() - 2
                        && self.pc == self.frames[self.lev - 1].left_pc + 1;
                    if is_tail {
                        n = CONSUME_REMAINDER;
                    }
                    self.pc += 1;
                    return Ok(Step { kind, repeat: n });
                }
            }
        }
    }
}

/// Scan forward from `start` (just past an already-consumed `(`) for the
/// `)` that closes it, accounting for nesting.
fn find_matching_rparen(program: &[u16], start: usize) -> Result<usize> {
    let mut depth = 1i32;
    let mut i = start;
    while i < program.len() {
        match Atom::decode(program[i]) {
            Atom::LParen { .. } => depth += 1,
            Atom::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            Atom::Primitive { .. } => {}
        }
        i += 1;
    }
    Err(HipoError::BadFormat {
        reason: "unmatched '(' while skipping a zero-repeat group".to_string(),
    })
}

/// Swap `program`-described data in place over `buf[pos..pos+len]`. `order`
/// is the byte order the data is currently in; bytes are reversed in place,
/// so no destination order needs to be threaded through.
pub fn swap_in_place(buf: &mut [u8], pos: usize, len: usize, program: &[u16], order: ByteOrder) -> Result<()> {
    let end = pos + len;
    if buf.len() < end {
        return Err(HipoError::TruncatedBuffer {
            offset: pos,
            needed: len,
            available: buf.len().saturating_sub(pos),
        });
    }
    let mut machine = Machine::new(program)?;
    let mut cur = pos;
    while cur < end {
        let step = machine.next(|source| {
            let bytes = source.data_bytes();
            require(buf, cur, bytes, end)?;
            let value = read_repeat_value(&buf[cur..], source, order);
            swap_bytes(&mut buf[cur..cur + bytes]);
            cur += bytes;
            Ok(value)
        })?;
        cur += execute_swap(&mut buf[..end], cur, step)?;
    }
    Ok(())
}

fn execute_swap(buf: &mut [u8], pos: usize, step: Step) -> Result<usize> {
    let end = buf.len();
    let size = step.kind.element_size();
    let max_elems = if size == 0 { 0 } else { (end - pos) / size };
    let n = (step.repeat as usize).min(max_elems);
    if step.kind.is_byte_copy() {
        return Ok(n);
    }
    let mut off = pos;
    for _ in 0..n {
        swap_element(&mut buf[off..off + size]);
        off += size;
    }
    Ok(n * size)
}

fn swap_element(bytes: &mut [u8]) {
    match bytes.len() {
        2 => swap16(bytes),
        4 => swap32(bytes),
        8 => swap64(bytes),
        _ => {}
    }
}

fn swap_bytes(bytes: &mut [u8]) {
    swap_element(bytes);
}

fn require(buf: &[u8], pos: usize, needed: usize, end: usize) -> Result<()> {
    if pos + needed > end || pos + needed > buf.len() {
        return Err(HipoError::TruncatedBuffer {
            offset: pos,
            needed,
            available: buf.len().saturating_sub(pos),
        });
    }
    Ok(())
}

fn read_repeat_value(buf: &[u8], source: RepeatSource, order: ByteOrder) -> u32 {
    match source {
        RepeatSource::DataI32 => order.read_u32(buf),
        RepeatSource::DataI16 => order.read_u16(buf) as u32,
        RepeatSource::DataI8 => buf[0] as u32,
        RepeatSource::Literal => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::format::compile;

    #[test]
    fn swap_then_swap_is_identity() {
        let program = compile("N(I,F)").unwrap();
        let mut buf = Vec::new();
        buf.extend_from_slice(&2i32.to_le_bytes());
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&1.0f32.to_le_bytes());
        buf.extend_from_slice(&2i32.to_le_bytes());
        buf.extend_from_slice(&2.0f32.to_le_bytes());
        let original = buf.clone();

        swap_in_place(&mut buf, 0, buf.len(), &program, ByteOrder::Little).unwrap();
        assert_ne!(buf, original);
        swap_in_place(&mut buf, 0, buf.len(), &program, ByteOrder::Big).unwrap();
        assert_eq!(buf, original);
    }

    #[test]
    fn zero_repeat_moves_no_data() {
        let program = compile("N(I)").unwrap();
        let mut buf = 0i32.to_le_bytes().to_vec();
        let original = buf.clone();
        swap_in_place(&mut buf, 0, buf.len(), &program, ByteOrder::Little).unwrap();
        // only the N count itself (which is 0) gets byte-swapped; no I elements follow
        assert_eq!(buf.len(), original.len());
    }

    #[test]
    fn tail_group_consumes_remaining_data_regardless_of_declared_count() {
        // "N(I)" is a single-atom tail group: once the declared count N is
        // read, the sole primitive inside still absorbs every remaining
        // element rather than stopping after N.
        let program = compile("N(I)").unwrap();
        let mut buf = Vec::new();
        buf.extend_from_slice(&2i32.to_le_bytes()); // declared N = 2 (ignored)
        for v in [10i32, 20, 30, 40, 50] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let original = buf.clone();

        swap_in_place(&mut buf, 0, buf.len(), &program, ByteOrder::Little).unwrap();
        assert_ne!(buf, original);
        // every int32 after the count word was swapped, not just the first two
        for (chunk, orig_chunk) in buf[4..].chunks_exact(4).zip(original[4..].chunks_exact(4)) {
            assert_ne!(chunk, orig_chunk);
        }
        swap_in_place(&mut buf, 0, buf.len(), &program, ByteOrder::Big).unwrap();
        assert_eq!(buf, original);
    }

    #[test]
    fn flat_repeat_swaps_all_elements() {
        let program = compile("3I").unwrap();
        let mut buf = Vec::new();
        for v in [1i32, 2, 3] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let original = buf.clone();
        swap_in_place(&mut buf, 0, buf.len(), &program, ByteOrder::Little).unwrap();
        assert_ne!(buf, original);
        swap_in_place(&mut buf, 0, buf.len(), &program, ByteOrder::Big).unwrap();
        assert_eq!(buf, original);
    }
}
