//! Composite-data format compiler, stack-machine interpreter, and the
//! `CompositeData` value type built on top of them.

pub mod data;
pub mod format;
pub mod interp;

pub use data::{CompositeData, CompositeItem};
pub use format::{compile, Program};
