//! Record-level codec: decoding a record from a byte source ([`input`]) and
//! serializing accumulated events into one ([`output`]).

pub mod input;
pub mod output;

pub use input::RecordInput;
pub use output::{RecordOutput, RecordOutputConfig};
