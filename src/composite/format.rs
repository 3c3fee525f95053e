//! Compiles a composite-data format string into a 16-bit bytecode program
//! that [`super::interp`] drives.
//!
//! Format alphabet: `( ) , 0-9 N n m i F a S s C c D L l I A`. Digits 2-9
//! (accumulated to 10-15) set a hard-coded repeat count for the atom that
//! follows; `N`/`n`/`m` mark the next atom's repeat count as data-driven
//! (read at runtime as i32/i16/i8 respectively); a bare atom repeats once.

use crate::error::{HipoError, Result};

/// Bits 0-7 of a bytecode word: primitive type code, or 0 for `(`/`)`.
pub const CODE_LPAREN_OR_RPAREN: u16 = 0;
const MAX_NESTING: i32 = 10;
const MAX_LITERAL_REPEAT: i32 = 15;

/// Primitive type codes occupying bits 0-7 of a bytecode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AtomKind {
    Uint32 = 1,
    Float32 = 2,
    Char8 = 3,
    Short16 = 4,
    UShort16 = 5,
    CharArray8 = 6,
    UCharArray8 = 7,
    Double64 = 8,
    Long64 = 9,
    ULong64 = 10,
    Int32 = 11,
    Hollerit = 12,
}

impl AtomKind {
    fn from_char(ch: char) -> Option<AtomKind> {
        Some(match ch {
            'i' => AtomKind::Uint32,
            'F' => AtomKind::Float32,
            'a' => AtomKind::Char8,
            'S' => AtomKind::Short16,
            's' => AtomKind::UShort16,
            'C' => AtomKind::CharArray8,
            'c' => AtomKind::UCharArray8,
            'D' => AtomKind::Double64,
            'L' => AtomKind::Long64,
            'l' => AtomKind::ULong64,
            'I' => AtomKind::Int32,
            'A' => AtomKind::Hollerit,
            _ => return None,
        })
    }

    pub fn from_code(code: u8) -> Option<AtomKind> {
        Some(match code {
            1 => AtomKind::Uint32,
            2 => AtomKind::Float32,
            3 => AtomKind::Char8,
            4 => AtomKind::Short16,
            5 => AtomKind::UShort16,
            6 => AtomKind::CharArray8,
            7 => AtomKind::UCharArray8,
            8 => AtomKind::Double64,
            9 => AtomKind::Long64,
            10 => AtomKind::ULong64,
            11 => AtomKind::Int32,
            12 => AtomKind::Hollerit,
            _ => return None,
        })
    }

    /// Element size in bytes, for the types that are swapped element-wise.
    pub fn element_size(self) -> usize {
        match self {
            AtomKind::Double64 | AtomKind::Long64 | AtomKind::ULong64 => 8,
            AtomKind::Uint32 | AtomKind::Float32 | AtomKind::Int32 | AtomKind::Hollerit => 4,
            AtomKind::Short16 | AtomKind::UShort16 => 2,
            AtomKind::Char8 | AtomKind::CharArray8 | AtomKind::UCharArray8 => 1,
        }
    }

    /// Whether this type is copied byte-for-byte rather than swapped.
    pub fn is_byte_copy(self) -> bool {
        matches!(self, AtomKind::Char8 | AtomKind::CharArray8 | AtomKind::UCharArray8)
    }
}

/// Where an atom's repeat count comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatSource {
    Literal,
    DataI32,
    DataI16,
    DataI8,
}

impl RepeatSource {
    fn from_bits(bits: u16) -> RepeatSource {
        match bits {
            1 => RepeatSource::DataI32,
            2 => RepeatSource::DataI16,
            3 => RepeatSource::DataI8,
            _ => RepeatSource::Literal,
        }
    }

    fn to_bits(self) -> u16 {
        match self {
            RepeatSource::Literal => 0,
            RepeatSource::DataI32 => 1,
            RepeatSource::DataI16 => 2,
            RepeatSource::DataI8 => 3,
        }
    }

    pub fn data_bytes(self) -> usize {
        match self {
            RepeatSource::Literal => 0,
            RepeatSource::DataI32 => 4,
            RepeatSource::DataI16 => 2,
            RepeatSource::DataI8 => 1,
        }
    }
}

/// One decoded bytecode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atom {
    RParen,
    LParen { repeat: u16, source: RepeatSource },
    Primitive { kind: AtomKind, repeat: u16, source: RepeatSource },
}

impl Atom {
    pub fn decode(word: u16) -> Atom {
        let code = (word & 0xFF) as u8;
        let repeat = (word >> 8) & 0x3F;
        let source = RepeatSource::from_bits((word >> 14) & 0x3);
        if code == 0 {
            if repeat == 0 && source == RepeatSource::Literal {
                Atom::RParen
            } else {
                Atom::LParen { repeat, source }
            }
        } else {
            Atom::Primitive {
                kind: AtomKind::from_code(code).expect("compiled bytecode always has a valid type code"),
                repeat,
                source,
            }
        }
    }
}

/// A compiled format program: the raw bytecode words, callable anywhere a
/// `&[u16]` is expected via [`Deref`], but carrying its own [`Debug`] impl
/// that lists decoded atoms instead of raw words.
#[derive(Clone, PartialEq, Eq)]
pub struct Program(Vec<u16>);

impl Program {
    pub fn words(&self) -> &[u16] {
        &self.0
    }
}

impl std::ops::Deref for Program {
    type Target = [u16];

    fn deref(&self) -> &[u16] {
        &self.0
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for &word in &self.0 {
            list.entry(&Atom::decode(word));
        }
        list.finish()
    }
}

/// Compile a format string to bytecode. See module docs for the alphabet.
pub fn compile(format: &str) -> Result<Program> {
    let mut out: Vec<u16> = Vec::with_capacity(format.len());
    // nr < 0 means "an atom was just consumed; a digit may not immediately follow
    // without an intervening ',' or '('"; nr >= 0 is the pending literal repeat.
    let mut nr: i32 = 0;
    let mut nn: i32 = 1;
    let mut data_repeat_bytes: u8 = 0;
    let mut lev: i32 = 0;

    for ch in format.chars() {
        if ch == ' ' {
            continue;
        }
        if ch.is_ascii_digit() {
            if nr < 0 {
                return Err(bad_format("digit follows a completed atom without a separator"));
            }
            nr = nr * 10 + ch.to_digit(10).unwrap() as i32;
            if nr > MAX_LITERAL_REPEAT {
                return Err(bad_format("literal repeat count exceeds 15"));
            }
            continue;
        }
        match ch {
            '(' => {
                if nr < 0 {
                    return Err(bad_format("'(' follows a completed atom without a separator"));
                }
                lev += 1;
                if lev > MAX_NESTING {
                    return Err(bad_format("format nesting exceeds 10 levels"));
                }
                if nn == 0 {
                    let source = repeat_source_for(data_repeat_bytes)?;
                    out.push(source.to_bits() << 14);
                } else {
                    let count = nn.max(nr) & 0x3F;
                    out.push((count as u16) << 8);
                }
                nn = 1;
                nr = 0;
                data_repeat_bytes = 0;
            }
            ')' => {
                if nr >= 0 {
                    return Err(bad_format("')' must follow a completed atom"));
                }
                lev -= 1;
                if lev < 0 {
                    return Err(bad_format("unbalanced ')'"));
                }
                out.push(0);
                nr = -1;
            }
            ',' => {
                if nr >= 0 {
                    return Err(bad_format("',' must follow a completed atom"));
                }
                nr = 0;
            }
            'N' => {
                nn = 0;
                data_repeat_bytes = 4;
            }
            'n' => {
                nn = 0;
                data_repeat_bytes = 2;
            }
            'm' => {
                nn = 0;
                data_repeat_bytes = 1;
            }
            _ => {
                let kind = AtomKind::from_char(ch).ok_or_else(|| bad_format(&format!("illegal format character '{ch}'")))?;
                if nr < 0 {
                    return Err(bad_format("atom follows a completed atom without a separator"));
                }
                let count = nn.max(nr) & 0x3F;
                let mut word = ((count as u16) << 8) | (kind as u16);
                if data_repeat_bytes > 0 {
                    word |= repeat_source_for(data_repeat_bytes)?.to_bits() << 14;
                }
                out.push(word);
                nn = 1;
                nr = -1;
                data_repeat_bytes = 0;
            }
        }
    }

    if lev != 0 {
        return Err(bad_format("unbalanced '('"));
    }
    Ok(Program(out))
}

fn repeat_source_for(data_repeat_bytes: u8) -> Result<RepeatSource> {
    Ok(match data_repeat_bytes {
        4 => RepeatSource::DataI32,
        2 => RepeatSource::DataI16,
        1 => RepeatSource::DataI8,
        _ => return Err(bad_format("internal: unknown data-driven repeat width")),
    })
}

fn bad_format(reason: &str) -> HipoError {
    HipoError::BadFormat { reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_repeat_compiles() {
        let prog = compile("3I").unwrap();
        assert_eq!(prog.len(), 1);
        assert_eq!(Atom::decode(prog[0]), Atom::Primitive { kind: AtomKind::Int32, repeat: 3, source: RepeatSource::Literal });
    }

    #[test]
    fn n_group_compiles() {
        let prog = compile("N(I,F)").unwrap();
        assert_eq!(prog.len(), 4);
        assert_eq!(Atom::decode(prog[0]), Atom::LParen { repeat: 0, source: RepeatSource::DataI32 });
        assert_eq!(Atom::decode(prog[1]), Atom::Primitive { kind: AtomKind::Int32, repeat: 1, source: RepeatSource::Literal });
        assert_eq!(Atom::decode(prog[2]), Atom::Primitive { kind: AtomKind::Float32, repeat: 1, source: RepeatSource::Literal });
        assert_eq!(Atom::decode(prog[3]), Atom::RParen);
    }

    #[test]
    fn whitespace_is_ignored() {
        let a = compile("3I").unwrap();
        let b = compile(" 3 I ").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unbalanced_parens_are_rejected() {
        assert!(compile("(I").is_err());
        assert!(compile("I)").is_err());
    }

    #[test]
    fn adjacent_atoms_without_separator_are_rejected() {
        assert!(compile("II").is_err());
    }

    #[test]
    fn literal_repeat_over_15_is_rejected() {
        assert!(compile("16I").is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let fmt: String = "(".repeat(11) + "I" + &")".repeat(11);
        assert!(compile(&fmt).is_err());
    }

    #[test]
    fn program_debug_lists_decoded_atoms_not_raw_words() {
        let program = compile("N(I,F)").unwrap();
        let rendered = format!("{program:?}");
        assert!(rendered.contains("LParen"));
        assert!(rendered.contains("Int32"));
        assert!(rendered.contains("Float32"));
        assert!(rendered.contains("RParen"));
        assert!(!rendered.contains("0x"));
    }
}
