//! Errors that are reported to the caller.
//!
//! Broken invariants inside the passes are not part of this taxonomy; they
//! panic with a message starting with `internal invariant violation`.

use crate::ir::ValueType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("incompatible operand types {lhs} and {rhs}")]
    IncompatibleOperands { lhs: ValueType, rhs: ValueType },
    #[error("output of neuron {neuron} in layer {layer} must be a scalar, found {typ}")]
    NeuronOutputMustBeScalar {
        layer: usize,
        neuron: usize,
        typ: ValueType,
    },
    #[error("reduction argument must be a vector, found {0}")]
    ReductionRequiresVector(ValueType),
    #[error("reduction over an empty vector")]
    EmptyReduction,
    #[error("neuron {neuron} of layer {layer} reads the inputs of another neuron")]
    ForeignInput { layer: usize, neuron: usize },
    #[error("activation function `{name}` requires a scalar argument, found {typ}")]
    ActivationRequiresScalar { name: String, typ: ValueType },
    #[error("only vectors can be indexed, found {0}")]
    IndexRequiresVector(ValueType),
    #[error("index must be a scalar, found {0}")]
    IndexMustBeScalar(ValueType),
    #[error("assignment of {rhs} to {lhs}")]
    AssignmentTypeMismatch { lhs: ValueType, rhs: ValueType },
    #[error("assignment target must be a scalar, found {0}")]
    AssignmentRequiresScalar(ValueType),
    #[error("assignment target must be a variable or an indexed variable")]
    NotAnLValue,
    #[error("loop bounds must be scalars, found {0}")]
    LoopBoundMustBeScalar(ValueType),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("an output neuron cannot be the source of a connection")]
    OutputCannotBeSource,
    #[error("an input neuron cannot be the sink of a connection")]
    InputCannotBeSink,
    #[error("no connections given for neuron {neuron} of layer {layer}")]
    MissingConnections { layer: usize, neuron: usize },
    #[error("neuron {neuron} of layer {layer} has no forward propagation value")]
    MissingForwardValue { layer: usize, neuron: usize },
    #[error("layer {layer} has no neuron {neuron}")]
    UnknownNeuron { layer: usize, neuron: usize },
}

/// Any error that can come out of compiling a network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}
