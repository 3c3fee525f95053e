//! Endianness handling and the 4-byte padding rule shared by every header
//! and leaf in the format.

/// Byte order of a header, buffer, or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    pub fn is_big_endian(self) -> bool {
        matches!(self, ByteOrder::Big)
    }

    pub fn is_little_endian(self) -> bool {
        matches!(self, ByteOrder::Little)
    }

    pub fn opposite(self) -> ByteOrder {
        match self {
            ByteOrder::Big => ByteOrder::Little,
            ByteOrder::Little => ByteOrder::Big,
        }
    }

    /// Native byte order of the host this crate was compiled for.
    pub fn local() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    pub fn read_u16(self, buf: &[u8]) -> u16 {
        let b: [u8; 2] = buf[..2].try_into().unwrap();
        match self {
            ByteOrder::Big => u16::from_be_bytes(b),
            ByteOrder::Little => u16::from_le_bytes(b),
        }
    }

    pub fn read_u32(self, buf: &[u8]) -> u32 {
        let b: [u8; 4] = buf[..4].try_into().unwrap();
        match self {
            ByteOrder::Big => u32::from_be_bytes(b),
            ByteOrder::Little => u32::from_le_bytes(b),
        }
    }

    pub fn read_u64(self, buf: &[u8]) -> u64 {
        let b: [u8; 8] = buf[..8].try_into().unwrap();
        match self {
            ByteOrder::Big => u64::from_be_bytes(b),
            ByteOrder::Little => u64::from_le_bytes(b),
        }
    }

    pub fn write_u16(self, buf: &mut [u8], value: u16) {
        let b = match self {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        buf[..2].copy_from_slice(&b);
    }

    pub fn write_u32(self, buf: &mut [u8], value: u32) {
        let b = match self {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        buf[..4].copy_from_slice(&b);
    }

    pub fn write_u64(self, buf: &mut [u8], value: u64) {
        let b = match self {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        buf[..8].copy_from_slice(&b);
    }
}

/// Swap a 16-bit word's bytes in place.
pub fn swap16(buf: &mut [u8]) {
    buf.swap(0, 1);
}

/// Swap a 32-bit word's bytes in place.
pub fn swap32(buf: &mut [u8]) {
    buf.swap(0, 3);
    buf.swap(1, 2);
}

/// Swap a 64-bit word's bytes in place.
pub fn swap64(buf: &mut [u8]) {
    buf.swap(0, 7);
    buf.swap(1, 6);
    buf.swap(2, 5);
    buf.swap(3, 4);
}

/// Bytes needed to round `n` up to the next 4-byte boundary: `(4 - n mod 4) mod 4`.
pub fn pad(n: u32) -> u32 {
    (4 - (n % 4)) % 4
}

/// `ceil(n / 4)`, i.e. the number of 4-byte words needed to hold `n` bytes.
pub fn ceil_div4(n: u32) -> u32 {
    (n + 3) / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_covers_all_residues() {
        assert_eq!(pad(0), 0);
        assert_eq!(pad(1), 3);
        assert_eq!(pad(2), 2);
        assert_eq!(pad(3), 1);
        assert_eq!(pad(4), 0);
        assert_eq!(pad(5), 3);
    }

    #[test]
    fn ceil_div4_rounds_up() {
        assert_eq!(ceil_div4(0), 0);
        assert_eq!(ceil_div4(1), 1);
        assert_eq!(ceil_div4(4), 1);
        assert_eq!(ceil_div4(5), 2);
    }

    #[test]
    fn swap_round_trips() {
        let mut b = [1u8, 2, 3, 4];
        swap32(&mut b);
        assert_eq!(b, [4, 3, 2, 1]);
        swap32(&mut b);
        assert_eq!(b, [1, 2, 3, 4]);

        let mut h = [1u8, 2];
        swap16(&mut h);
        assert_eq!(h, [2, 1]);

        let mut q = [1u8, 2, 3, 4, 5, 6, 7, 8];
        swap64(&mut q);
        assert_eq!(q, [8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn read_write_round_trip_both_orders() {
        let mut buf = [0u8; 8];
        ByteOrder::Big.write_u64(&mut buf, 0x0102030405060708);
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(ByteOrder::Big.read_u64(&buf), 0x0102030405060708);

        ByteOrder::Little.write_u32(&mut buf, 0xC0DA0100);
        assert_eq!(ByteOrder::Little.read_u32(&buf), 0xC0DA0100);
    }
}
