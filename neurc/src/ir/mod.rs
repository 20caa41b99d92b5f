//! Expressions that define the output of a neuron.
//!
//! Expressions are stored in an [Expressions] arena and are built by users
//! via [Expr]. The same [Value] type is reused by the lowered IR in
//! [crate::lir], which adds variables, indexing and value set lookups.

mod expr;
mod structure;
mod typ;
mod value;

pub use expr::constant;
pub use expr::Expr;
pub use structure::structurally_identical;
pub use typ::ScalarType;
pub use typ::ValueType;
pub use value::Expressions;
pub use value::ReductionKind;
pub use value::TypeEnv;
pub use value::Value;
pub use value::ValueId;
