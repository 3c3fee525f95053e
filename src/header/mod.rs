//! Fixed-layout header codecs: the bit-info word shared by record and file
//! headers, the 56-byte record/file header itself, and the bank/segment/
//! tag-segment structure headers.

pub mod bitinfo;
pub mod file;
pub mod record;
pub mod structure;

pub use bitinfo::BitInfo;
pub use file::FileHeader;
pub use record::{RecordHeader, HEADER_SIZE_BYTES, HEADER_SIZE_WORDS, MAGIC};
pub use structure::{BankHeader, SegmentHeader, TagSegmentHeader};
