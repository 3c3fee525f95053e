//! Reader/writer for the EVIO/HIPO self-describing record container format
//! used in nuclear/particle-physics data acquisition.
//!
//! A file or buffer is a sequence of *records* (fixed 56-byte header,
//! optional index, optional padded user header, a possibly-compressed
//! payload of *events*). Each event is a nested tree of typed evio
//! structures — banks, segments, tag-segments — bottoming out in either a
//! uniform primitive array or a *composite* leaf whose shape is described by
//! a small format string compiled to bytecode.
//!
//! Module map, leaves first:
//! - [`byte_order`] / [`cursor`]: endianness-aware primitive reads/writes.
//! - [`compression`]: the none/LZ4/LZ4-best/GZIP adapter.
//! - [`header`]: fixed-layout header codecs (file, record, and the three
//!   evio structure kinds).
//! - [`record`]: decode ([`record::RecordInput`]) and build
//!   ([`record::RecordOutput`]) one record.
//! - [`evio`]: recursive scan and byte-order swap of an event's structure
//!   tree.
//! - [`composite`]: the format-string compiler and stack-machine
//!   interpreter for composite-data leaves.
//! - [`writer`] / [`reader`]: sequence records into or out of a whole file
//!   or buffer.

pub mod byte_order;
pub mod compression;
pub mod composite;
pub mod cursor;
pub mod data_type;
pub mod error;
pub mod evio;
pub mod header;
pub mod reader;
pub mod record;
pub mod writer;

pub use byte_order::ByteOrder;
pub use compression::CompressionType;
pub use cursor::ByteCursor;
pub use data_type::{DataType, EventType, HeaderType};
pub use error::{HipoError, Result};
pub use reader::Reader;
pub use record::{RecordInput, RecordOutput, RecordOutputConfig};
pub use writer::{SplitStatus, Writer, WriterOptions};
