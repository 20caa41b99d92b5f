//! Low-level IR produced by lowering a network.
//!
//! Unlike the expressions in [crate::ir], this IR has variables, loops and
//! indexing. A [Function] owns its own [crate::ir::Expressions] arena in which
//! the right-hand sides of assignments are stored.

mod function;
mod statement;
mod value_set;
mod verify;

pub use function::Function;
pub use function::Variable;
pub use function::VariableId;
pub use statement::Assignment;
pub use statement::ForLoop;
pub use statement::Statement;
pub use value_set::Constant;
pub use value_set::ValueSet;
pub use value_set::ValueSetId;
