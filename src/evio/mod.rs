//! Recursive-descent codec for evio event structures: the arena tree
//! representation ([`node`]), the scan that builds it ([`scan`]), and the
//! byte-order flip that walks it ([`swap`]).

pub mod node;
pub mod scan;
pub mod swap;

pub use node::{EvioNode, EvioTree};
pub use scan::extract_event;
pub use swap::{swap_event, swap_structure_in_place};
