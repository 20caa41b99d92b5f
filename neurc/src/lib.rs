//! neurc compiles neural network descriptions into loop-based code.
//!
//! A [network::Network] is a layered graph of neurons. Every neuron carries a
//! small expression (its forward value) built with [ir::Expr], for example
//! `sigmoid(sum(weights * inputs) + bias)`.
//!
//! Compilation has three stages:
//!
//! 1. Type checking ([check_types]) makes sure that every forward value is
//!    well typed and produces a scalar.
//! 2. Grouping ([network::collect_ensembles]) finds contiguous runs of
//!    neurons in a layer whose expressions only differ in their literals and
//!    whose inputs are wired the same way. Such a run is an ensemble.
//! 3. Lowering ([construct_ir_for_network]) emits one loop per ensemble. The
//!    literals of the members are moved into value sets that the loop body
//!    reads by neuron index.
//!
//! ```
//! use neurc::samples::simple_network;
//!
//! let network = simple_network(2, 1);
//! let function = neurc::construct_ir_for_network(&network).unwrap();
//! assert_eq!(function.statements().len(), 3);
//! ```

pub mod convert;
pub mod error;
pub mod ir;
pub mod lir;
pub mod network;
pub mod samples;
#[cfg(feature = "test-utils")]
pub mod tester;
mod transform;

pub use convert::construct_ir_for_network;
pub use error::CompileError;
pub use error::GraphError;
pub use error::TypeError;
pub use network::check_types;
pub use transform::compile;
pub use transform::default_arguments;
pub use transform::display_ensembles;
pub use transform::init_subscriber;
pub use transform::CompileOptions;
pub use transform::Compiled;
