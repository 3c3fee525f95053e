//! Compression adapter: a uniform interface to none / LZ4 / LZ4-best / GZIP
//! over contiguous byte ranges.

use crate::error::{HipoError, Result};

/// Closed set of record-level compression codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum CompressionType {
    Uncompressed,
    Lz4,
    Lz4Best,
    Gzip,
}

impl CompressionType {
    pub fn from_value(value: u8) -> Option<CompressionType> {
        match value {
            0 => Some(CompressionType::Uncompressed),
            1 => Some(CompressionType::Lz4),
            2 => Some(CompressionType::Lz4Best),
            3 => Some(CompressionType::Gzip),
            _ => None,
        }
    }

    pub fn to_value(self) -> u8 {
        match self {
            CompressionType::Uncompressed => 0,
            CompressionType::Lz4 => 1,
            CompressionType::Lz4Best => 2,
            CompressionType::Gzip => 3,
        }
    }

}

/// Compression level passed to the LZ4 HC encoder for `Lz4Best`. Chosen to
/// match LZ4's own CLI default for `-9` (max normal preset, short of the
/// exhaustive `--best`/`-12` search), trading a little ratio for speed.
const LZ4_BEST_LEVEL: u32 = 9;

/// Compress `src` into a freshly allocated buffer.
pub fn compress(kind: CompressionType, src: &[u8]) -> Result<Vec<u8>> {
    match kind {
        CompressionType::Uncompressed => Ok(src.to_vec()),
        CompressionType::Lz4 => Ok(lz4_flex::block::compress(src)),
        CompressionType::Lz4Best => Ok(lz4_flex::block::compress_hc(src, LZ4_BEST_LEVEL)),
        CompressionType::Gzip => compress_gzip(src),
    }
}

#[cfg(feature = "gzip")]
fn compress_gzip(src: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(src).map_err(|e| HipoError::CompressionFailure {
        codec: "gzip",
        reason: e.to_string(),
    })?;
    encoder.finish().map_err(|e| HipoError::CompressionFailure {
        codec: "gzip",
        reason: e.to_string(),
    })
}

#[cfg(not(feature = "gzip"))]
fn compress_gzip(_src: &[u8]) -> Result<Vec<u8>> {
    Err(HipoError::UnsupportedCompression { offset: 0, code: 3 })
}

/// Decompress `src` (which was compressed with `kind`) into `dst`, which
/// must already have capacity for the expected uncompressed length. Returns
/// the number of bytes written.
pub fn decompress_into(kind: CompressionType, src: &[u8], dst: &mut [u8]) -> Result<usize> {
    match kind {
        CompressionType::Uncompressed => {
            if dst.len() < src.len() {
                return Err(HipoError::BufferOverflow {
                    capacity: dst.len(),
                    needed: src.len(),
                });
            }
            dst[..src.len()].copy_from_slice(src);
            Ok(src.len())
        }
        CompressionType::Lz4 | CompressionType::Lz4Best => {
            lz4_flex::block::decompress_into(src, dst).map_err(|e| HipoError::CompressionFailure {
                codec: "lz4",
                reason: e.to_string(),
            })
        }
        CompressionType::Gzip => decompress_gzip_into(src, dst),
    }
}

#[cfg(feature = "gzip")]
fn decompress_gzip_into(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(src);
    let mut written = 0usize;
    loop {
        if written == dst.len() {
            break;
        }
        let n = decoder
            .read(&mut dst[written..])
            .map_err(|e| HipoError::CompressionFailure {
                codec: "gzip",
                reason: e.to_string(),
            })?;
        if n == 0 {
            break;
        }
        written += n;
    }
    Ok(written)
}

#[cfg(not(feature = "gzip"))]
fn decompress_gzip_into(_src: &[u8], _dst: &mut [u8]) -> Result<usize> {
    Err(HipoError::UnsupportedCompression { offset: 0, code: 3 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(kind: CompressionType) {
        let src = b"the quick brown fox jumps over the lazy dog, repeated. the quick brown fox jumps over the lazy dog.".to_vec();
        let compressed = compress(kind, &src).unwrap();
        let mut dst = vec![0u8; src.len()];
        let n = decompress_into(kind, &compressed, &mut dst).unwrap();
        assert_eq!(n, src.len());
        assert_eq!(&dst[..n], &src[..]);
    }

    #[test]
    fn uncompressed_round_trips() {
        round_trip(CompressionType::Uncompressed);
    }

    #[test]
    fn lz4_round_trips() {
        round_trip(CompressionType::Lz4);
    }

    #[test]
    fn lz4_best_round_trips() {
        round_trip(CompressionType::Lz4Best);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn gzip_round_trips() {
        round_trip(CompressionType::Gzip);
    }

    #[test]
    fn code_round_trips() {
        for v in 0u8..4 {
            let kind = CompressionType::from_value(v).unwrap();
            assert_eq!(kind.to_value(), v);
        }
        assert!(CompressionType::from_value(4).is_none());
    }
}
