use crate::ir::Expressions;
use crate::ir::ReductionKind;
use crate::ir::Value;
use crate::ir::ValueId;
use crate::network::NeuronId;
use std::collections::HashMap;
use std::ops::Add;
use std::ops::Div;
use std::ops::Mul;
use std::ops::Neg;
use std::ops::Sub;
use std::rc::Rc;

enum ExprNode {
    Integer(i64),
    Boolean(bool),
    Real(f64),
    RealVector(Vec<f64>),
    Plus(Expr),
    Minus(Expr),
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Div(Expr, Expr),
    Input(NeuronId),
    Reduction(Expr, ReductionKind),
    Activation(Expr, String),
}

/// Builder for forward propagation values.
///
/// Cloning an [Expr] shares the node, so using the same [Expr] twice in an
/// expression produces a DAG in which the shared part is computed once:
///
/// ```
/// use neurc::ir::Expr;
/// use neurc::ir::ReductionKind;
/// use neurc::network::Network;
///
/// let mut net = Network::new();
/// let inputs = net.add_layer();
/// let hidden = net.add_layer();
/// let x0 = net.add_input_neuron(inputs);
/// let n = net.add_neuron(hidden);
/// net.connect(x0, n).unwrap();
///
/// let x = Expr::input(n);
/// let wx = Expr::real_vector(vec![0.5]) * x;
/// let out = (wx.reduce(ReductionKind::Sum) + Expr::real(1.0)).activation("sigmoid");
/// net.set_forward_value(n, &out);
/// assert!(net.check_types().is_ok());
/// ```
///
/// Lowered-only values such as variables cannot be expressed with this type.
#[derive(Clone)]
pub struct Expr(Rc<ExprNode>);

impl Expr {
    fn new(node: ExprNode) -> Expr {
        Expr(Rc::new(node))
    }
    pub fn integer(value: i64) -> Expr {
        Expr::new(ExprNode::Integer(value))
    }
    pub fn boolean(value: bool) -> Expr {
        Expr::new(ExprNode::Boolean(value))
    }
    pub fn real(value: f64) -> Expr {
        Expr::new(ExprNode::Real(value))
    }
    pub fn real_vector(values: Vec<f64>) -> Expr {
        Expr::new(ExprNode::RealVector(values))
    }
    /// The inputs of `neuron`, which should be the neuron that owns the
    /// expression.
    pub fn input(neuron: NeuronId) -> Expr {
        Expr::new(ExprNode::Input(neuron))
    }
    pub fn plus(&self) -> Expr {
        Expr::new(ExprNode::Plus(self.clone()))
    }
    pub fn reduce(&self, kind: ReductionKind) -> Expr {
        Expr::new(ExprNode::Reduction(self.clone(), kind))
    }
    pub fn activation(&self, name: &str) -> Expr {
        Expr::new(ExprNode::Activation(self.clone(), name.to_string()))
    }
    /// Copy the DAG into `exprs`, keeping shared nodes shared.
    pub(crate) fn intern(&self, exprs: &mut Expressions) -> ValueId {
        let mut seen = HashMap::new();
        self.intern_node(exprs, &mut seen)
    }
    fn intern_node(
        &self,
        exprs: &mut Expressions,
        seen: &mut HashMap<*const ExprNode, ValueId>,
    ) -> ValueId {
        let key = Rc::as_ptr(&self.0);
        if let Some(id) = seen.get(&key) {
            return *id;
        }
        let mut sub = |e: &Expr| e.intern_node(exprs, seen);
        let value = match &*self.0 {
            ExprNode::Integer(v) => Value::IntegerConstant(*v),
            ExprNode::Boolean(v) => Value::BooleanConstant(*v),
            ExprNode::Real(v) => Value::RealConstant(*v),
            ExprNode::RealVector(v) => Value::RealVectorConstant(v.clone()),
            ExprNode::Plus(x) => Value::UnaryPlus(sub(x)),
            ExprNode::Minus(x) => Value::UnaryMinus(sub(x)),
            ExprNode::Add(l, r) => {
                let l = sub(l);
                Value::BinaryAdd(l, sub(r))
            }
            ExprNode::Sub(l, r) => {
                let l = sub(l);
                Value::BinarySubtract(l, sub(r))
            }
            ExprNode::Mul(l, r) => {
                let l = sub(l);
                Value::BinaryMultiply(l, sub(r))
            }
            ExprNode::Div(l, r) => {
                let l = sub(l);
                Value::BinaryDivide(l, sub(r))
            }
            ExprNode::Input(neuron) => Value::GetInputValue(*neuron),
            ExprNode::Reduction(x, kind) => Value::Reduction(sub(x), *kind),
            ExprNode::Activation(x, name) => Value::ActivationFunction(sub(x), name.clone()),
        };
        let id = exprs.push(value);
        seen.insert(key, id);
        id
    }
}

/// Shorthand for building a constant.
pub fn constant<T: Into<Expr>>(value: T) -> Expr {
    value.into()
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::integer(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::integer(value as i64)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::boolean(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::real(value)
    }
}

impl From<Vec<f64>> for Expr {
    fn from(values: Vec<f64>) -> Self {
        Expr::real_vector(values)
    }
}

impl From<&[f64]> for Expr {
    fn from(values: &[f64]) -> Self {
        Expr::real_vector(values.to_vec())
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $node:ident) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::new(ExprNode::$node(self, rhs))
            }
        }
        impl $trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::new(ExprNode::$node(self, rhs.clone()))
            }
        }
        impl $trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::new(ExprNode::$node(self.clone(), rhs))
            }
        }
        impl $trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::new(ExprNode::$node(self.clone(), rhs.clone()))
            }
        }
    };
}

binary_operator!(Add, add, Add);
binary_operator!(Sub, sub, Sub);
binary_operator!(Mul, mul, Mul);
binary_operator!(Div, div, Div);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::new(ExprNode::Minus(self))
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::new(ExprNode::Minus(self.clone()))
    }
}
