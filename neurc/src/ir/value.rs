use crate::error::TypeError;
use crate::ir::ScalarType;
use crate::ir::ValueType;
use crate::lir::ValueSetId;
use crate::lir::VariableId;
use crate::network::NeuronId;
use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Index;

/// Stable index of a [Value] inside an [Expressions] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u32);

impl ValueId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for ValueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionKind {
    Sum,
    Multiply,
    Max,
}

impl Display for ReductionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReductionKind::Sum => write!(f, "sum"),
            ReductionKind::Multiply => write!(f, "product"),
            ReductionKind::Max => write!(f, "max"),
        }
    }
}

/// A node in an expression DAG.
///
/// Operands are referenced by [ValueId] so that sub-expressions can be
/// shared. The last four variants only exist in lowered code: the DSL builder
/// ([crate::ir::Expr]) has no way to express them and only the crate itself
/// can push nodes into an arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    IntegerConstant(i64),
    BooleanConstant(bool),
    RealConstant(f64),
    RealVectorConstant(Vec<f64>),
    UnaryPlus(ValueId),
    UnaryMinus(ValueId),
    BinaryAdd(ValueId, ValueId),
    BinarySubtract(ValueId, ValueId),
    BinaryMultiply(ValueId, ValueId),
    BinaryDivide(ValueId, ValueId),
    /// Reads the inputs of the given (owning) neuron.
    GetInputValue(NeuronId),
    Reduction(ValueId, ReductionKind),
    ActivationFunction(ValueId, String),
    Variable(VariableId),
    IndexedValue(VariableId, ValueId),
    /// Row `index` of a value set.
    GetValue(ValueSetId, ValueId),
    BinaryMax(ValueId, ValueId),
}

impl Value {
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Value::IntegerConstant(_)
                | Value::BooleanConstant(_)
                | Value::RealConstant(_)
                | Value::RealVectorConstant(_)
        )
    }
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Value::Variable(_) | Value::IndexedValue(_, _))
    }
    /// Operands in evaluation order.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Value::UnaryPlus(x)
            | Value::UnaryMinus(x)
            | Value::Reduction(x, _)
            | Value::ActivationFunction(x, _)
            | Value::IndexedValue(_, x)
            | Value::GetValue(_, x) => vec![*x],
            Value::BinaryAdd(l, r)
            | Value::BinarySubtract(l, r)
            | Value::BinaryMultiply(l, r)
            | Value::BinaryDivide(l, r)
            | Value::BinaryMax(l, r) => vec![*l, *r],
            _ => vec![],
        }
    }
    /// Short operator name used in listings.
    pub fn mnemonic(&self) -> String {
        match self {
            Value::IntegerConstant(_)
            | Value::BooleanConstant(_)
            | Value::RealConstant(_)
            | Value::RealVectorConstant(_) => "constant".to_string(),
            Value::UnaryPlus(_) => "plus".to_string(),
            Value::UnaryMinus(_) => "minus".to_string(),
            Value::BinaryAdd(_, _) => "add".to_string(),
            Value::BinarySubtract(_, _) => "sub".to_string(),
            Value::BinaryMultiply(_, _) => "mul".to_string(),
            Value::BinaryDivide(_, _) => "div".to_string(),
            Value::BinaryMax(_, _) => "max".to_string(),
            Value::GetInputValue(_) => "input".to_string(),
            Value::Reduction(_, kind) => format!("reduce.{kind}"),
            Value::ActivationFunction(_, name) => name.clone(),
            Value::Variable(_) => "var".to_string(),
            Value::IndexedValue(_, _) => "index".to_string(),
            Value::GetValue(_, _) => "getvalue".to_string(),
        }
    }
}

/// Resolves the types of leaves that depend on their surroundings.
///
/// The network resolves neuron inputs, a lowered function resolves its
/// variables and value sets. Asking either one for the other kind of leaf is
/// a bug in the caller.
pub trait TypeEnv {
    fn input_type(&self, neuron: NeuronId) -> ValueType {
        panic!("internal invariant violation: input of {neuron} read outside of a network")
    }
    fn variable_type(&self, var: VariableId) -> ValueType {
        panic!("internal invariant violation: {var} used outside of a function")
    }
    fn value_set_type(&self, set: ValueSetId) -> ValueType {
        panic!("internal invariant violation: {set} used outside of a function")
    }
}

#[derive(Debug)]
struct Node {
    value: Value,
    typ: OnceCell<ValueType>,
}

/// Arena holding the nodes of one or more expression DAGs.
///
/// Nodes are immutable once pushed. Inferred types are cached per node.
#[derive(Debug, Default)]
pub struct Expressions {
    nodes: Vec<Node>,
}

impl Expressions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn get(&self, id: ValueId) -> &Value {
        &self.nodes[id.index()].value
    }
    pub fn ids(&self) -> impl Iterator<Item = ValueId> {
        (0..self.nodes.len() as u32).map(ValueId)
    }
    pub(crate) fn push(&mut self, value: Value) -> ValueId {
        let id = ValueId(self.nodes.len() as u32);
        self.nodes.push(Node {
            value,
            typ: OnceCell::new(),
        });
        id
    }
    /// Forget all cached types.
    ///
    /// Needed when the surroundings change, for example when a connection
    /// changes the number of inputs of a neuron.
    pub(crate) fn clear_types(&mut self) {
        for node in self.nodes.iter_mut() {
            node.typ.take();
        }
    }
    /// Infer the type of `id`, caching the result.
    pub fn infer_type(&self, id: ValueId, env: &dyn TypeEnv) -> Result<ValueType, TypeError> {
        let node = &self.nodes[id.index()];
        if let Some(typ) = node.typ.get() {
            return Ok(typ.clone());
        }
        let typ = self.infer_uncached(&node.value, env)?;
        Ok(node.typ.get_or_init(|| typ).clone())
    }
    fn infer_uncached(&self, value: &Value, env: &dyn TypeEnv) -> Result<ValueType, TypeError> {
        let typ = match value {
            Value::IntegerConstant(_) => ValueType::Integer,
            Value::BooleanConstant(_) => ValueType::Boolean,
            Value::RealConstant(_) => ValueType::Real,
            Value::RealVectorConstant(values) => ValueType::vector(ScalarType::Real, values.len()),
            Value::UnaryPlus(x) | Value::UnaryMinus(x) => self.infer_type(*x, env)?,
            Value::BinaryAdd(l, r)
            | Value::BinarySubtract(l, r)
            | Value::BinaryMultiply(l, r)
            | Value::BinaryDivide(l, r)
            | Value::BinaryMax(l, r) => {
                let lhs = self.infer_type(*l, env)?;
                let rhs = self.infer_type(*r, env)?;
                lhs.join(&rhs)?
            }
            Value::GetInputValue(neuron) => env.input_type(*neuron),
            Value::Reduction(x, _) => match self.infer_type(*x, env)? {
                ValueType::Vector(_, Some(0)) => return Err(TypeError::EmptyReduction),
                ValueType::Vector(elem, _) => elem.into(),
                other => return Err(TypeError::ReductionRequiresVector(other)),
            },
            Value::ActivationFunction(x, name) => {
                let typ = self.infer_type(*x, env)?;
                if !typ.is_scalar() {
                    return Err(TypeError::ActivationRequiresScalar {
                        name: name.clone(),
                        typ,
                    });
                }
                typ
            }
            Value::Variable(var) => env.variable_type(*var),
            Value::IndexedValue(var, index) => {
                let typ = env.variable_type(*var);
                let ValueType::Vector(elem, _) = typ else {
                    return Err(TypeError::IndexRequiresVector(typ));
                };
                self.check_index(*index, env)?;
                elem.into()
            }
            Value::GetValue(set, index) => {
                self.check_index(*index, env)?;
                env.value_set_type(*set)
            }
        };
        Ok(typ)
    }
    fn check_index(&self, index: ValueId, env: &dyn TypeEnv) -> Result<(), TypeError> {
        let typ = self.infer_type(index, env)?;
        if typ.is_scalar() {
            Ok(())
        } else {
            Err(TypeError::IndexMustBeScalar(typ))
        }
    }
    /// Nodes reachable from `root` in pre-order.
    ///
    /// A shared node is visited once, at its first occurrence.
    pub fn preorder(&self, root: ValueId) -> Vec<ValueId> {
        let mut visited = HashSet::new();
        let mut out = vec![];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.get(id).operands().into_iter().rev());
        }
        out
    }
    /// Constant leaves reachable from `root` in pre-order.
    pub fn constants(&self, root: ValueId) -> Vec<ValueId> {
        self.preorder(root)
            .into_iter()
            .filter(|id| self.get(*id).is_constant())
            .collect()
    }
    /// Neurons whose inputs are read somewhere below `root`.
    pub fn input_neurons(&self, root: ValueId) -> Vec<NeuronId> {
        self.preorder(root)
            .into_iter()
            .filter_map(|id| match self.get(id) {
                Value::GetInputValue(neuron) => Some(*neuron),
                _ => None,
            })
            .collect()
    }
}

impl Index<ValueId> for Expressions {
    type Output = Value;

    fn index(&self, id: ValueId) -> &Value {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoEnv;

    impl TypeEnv for NoEnv {}

    #[test]
    fn infers_and_caches_types() {
        let mut exprs = Expressions::new();
        let w = exprs.push(Value::RealVectorConstant(vec![1.0, 2.0, 3.0]));
        let two = exprs.push(Value::IntegerConstant(2));
        let scaled = exprs.push(Value::BinaryMultiply(w, two));
        let sum = exprs.push(Value::Reduction(scaled, ReductionKind::Sum));
        let out = exprs.push(Value::ActivationFunction(sum, "tanh".to_string()));

        let typ = exprs.infer_type(scaled, &NoEnv).unwrap();
        assert_eq!(typ, ValueType::vector(ScalarType::Real, 3));
        assert_eq!(exprs.infer_type(out, &NoEnv).unwrap(), ValueType::Real);
        assert!(exprs.nodes[sum.index()].typ.get().is_some());
    }

    #[test]
    fn reduction_of_scalar_is_rejected() {
        let mut exprs = Expressions::new();
        let x = exprs.push(Value::RealConstant(1.0));
        let sum = exprs.push(Value::Reduction(x, ReductionKind::Max));
        let err = exprs.infer_type(sum, &NoEnv).unwrap_err();
        assert_eq!(err, TypeError::ReductionRequiresVector(ValueType::Real));
    }

    #[test]
    fn reduction_of_empty_vector_is_rejected() {
        let mut exprs = Expressions::new();
        let x = exprs.push(Value::RealVectorConstant(vec![]));
        let sum = exprs.push(Value::Reduction(x, ReductionKind::Sum));
        assert_eq!(exprs.infer_type(sum, &NoEnv), Err(TypeError::EmptyReduction));
    }

    #[test]
    fn preorder_visits_shared_nodes_once() {
        let mut exprs = Expressions::new();
        let a = exprs.push(Value::RealConstant(1.0));
        let b = exprs.push(Value::IntegerConstant(2));
        let ab = exprs.push(Value::BinaryAdd(a, b));
        let root = exprs.push(Value::BinaryMultiply(ab, a));
        assert_eq!(exprs.preorder(root), vec![root, ab, a, b]);
        assert_eq!(exprs.constants(root), vec![a, b]);
    }

    #[test]
    fn activation_of_vector_is_rejected() {
        let mut exprs = Expressions::new();
        let x = exprs.push(Value::RealVectorConstant(vec![0.5]));
        let act = exprs.push(Value::ActivationFunction(x, "relu".to_string()));
        let err = exprs.infer_type(act, &NoEnv).unwrap_err();
        assert!(matches!(err, TypeError::ActivationRequiresScalar { name, .. } if name == "relu"));
    }

    #[test]
    fn constants_are_collected_once_in_pre_order() {
        let mut exprs = Expressions::new();
        let a = exprs.push(Value::RealConstant(1.0));
        let b = exprs.push(Value::IntegerConstant(2));
        let ab = exprs.push(Value::BinaryAdd(a, b));
        let root = exprs.push(Value::BinaryMultiply(ab, a));
        assert_eq!(exprs.constants(root), vec![a, b]);
    }
}
