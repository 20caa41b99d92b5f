//! Conversion passes.
//!
//! Currently there is one: lowering a grouped network into a loop-based
//! [crate::lir::Function].

mod network_to_lir;

pub use network_to_lir::construct_ir_for_network;
pub use network_to_lir::Session;
