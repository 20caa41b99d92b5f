//! Shape comparison of expression DAGs.
//!
//! Two expressions are structurally identical when they only differ in the
//! values of their constants. Such expressions can be computed by the same
//! code, with the constants looked up per neuron.

use crate::ir::Expressions;
use crate::ir::TypeEnv;
use crate::ir::Value;
use crate::ir::ValueId;
use std::collections::HashMap;

/// Pairs up nodes of the two DAGs while walking them side by side.
///
/// The pairing must be one-to-one, otherwise one side shares a node that the
/// other side computes twice, and the constants would not line up.
struct Matching<'a> {
    exprs: &'a Expressions,
    env: &'a dyn TypeEnv,
    forward: HashMap<ValueId, ValueId>,
    backward: HashMap<ValueId, ValueId>,
}

impl Matching<'_> {
    fn pair(&mut self, a: ValueId, b: ValueId) -> bool {
        match (self.forward.get(&a), self.backward.get(&b)) {
            (Some(x), Some(y)) => return *x == b && *y == a,
            (None, None) => (),
            _ => return false,
        }
        self.forward.insert(a, b);
        self.backward.insert(b, a);
        self.compare(a, b)
    }
    fn compare(&mut self, a: ValueId, b: ValueId) -> bool {
        use Value::*;
        let same_kind = match (&self.exprs[a], &self.exprs[b]) {
            (IntegerConstant(_), IntegerConstant(_))
            | (BooleanConstant(_), BooleanConstant(_))
            | (RealConstant(_), RealConstant(_)) => true,
            // The length of the representative becomes a loop bound.
            (RealVectorConstant(x), RealVectorConstant(y)) => x.len() == y.len(),
            (UnaryPlus(_), UnaryPlus(_))
            | (UnaryMinus(_), UnaryMinus(_))
            | (BinaryAdd(_, _), BinaryAdd(_, _))
            | (BinarySubtract(_, _), BinarySubtract(_, _))
            | (BinaryMultiply(_, _), BinaryMultiply(_, _))
            | (BinaryDivide(_, _), BinaryDivide(_, _))
            | (BinaryMax(_, _), BinaryMax(_, _)) => true,
            (GetInputValue(_), GetInputValue(_)) => {
                let x = self.exprs.infer_type(a, self.env);
                let y = self.exprs.infer_type(b, self.env);
                matches!((x, y), (Ok(x), Ok(y)) if x == y)
            }
            (Reduction(_, x), Reduction(_, y)) => x == y,
            (ActivationFunction(_, x), ActivationFunction(_, y)) => x == y,
            _ => false,
        };
        if !same_kind {
            return false;
        }
        let lhs = self.exprs[a].operands();
        let rhs = self.exprs[b].operands();
        lhs.len() == rhs.len() && lhs.into_iter().zip(rhs).all(|(x, y)| self.pair(x, y))
    }
}

/// Whether `a` and `b` can be implemented by the same code.
///
/// Constant values are never compared, only the kind of constant. Operands
/// are compared position by position, so `a + b` and `b + a` are only
/// identical when `a` and `b` are.
pub fn structurally_identical(
    exprs: &Expressions,
    env: &dyn TypeEnv,
    a: ValueId,
    b: ValueId,
) -> bool {
    let mut matching = Matching {
        exprs,
        env,
        forward: HashMap::new(),
        backward: HashMap::new(),
    };
    matching.pair(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ReductionKind;

    struct NoEnv;

    impl TypeEnv for NoEnv {}

    #[test]
    fn literal_values_are_ignored() {
        let mut exprs = Expressions::new();
        let five = exprs.push(Value::IntegerConstant(5));
        let nine = exprs.push(Value::IntegerConstant(9));
        let real = exprs.push(Value::RealConstant(5.0));
        assert!(structurally_identical(&exprs, &NoEnv, five, nine));
        assert!(structurally_identical(&exprs, &NoEnv, five, five));
        assert!(!structurally_identical(&exprs, &NoEnv, five, real));
    }

    #[test]
    fn operators_must_match() {
        let mut exprs = Expressions::new();
        let a = exprs.push(Value::RealConstant(1.0));
        let b = exprs.push(Value::RealConstant(2.0));
        let sum = exprs.push(Value::BinaryAdd(a, b));
        let difference = exprs.push(Value::BinarySubtract(a, b));
        assert!(!structurally_identical(&exprs, &NoEnv, sum, difference));
    }

    #[test]
    fn operand_order_matters() {
        let mut exprs = Expressions::new();
        let a = exprs.push(Value::RealConstant(1.0));
        let v = exprs.push(Value::RealVectorConstant(vec![1.0]));
        let av = exprs.push(Value::BinaryMultiply(a, v));
        let va = exprs.push(Value::BinaryMultiply(v, a));
        assert!(!structurally_identical(&exprs, &NoEnv, av, va));
    }

    #[test]
    fn reductions_and_activations_compare_their_kind() {
        let mut exprs = Expressions::new();
        let v = exprs.push(Value::RealVectorConstant(vec![1.0, 2.0]));
        let sum = exprs.push(Value::Reduction(v, ReductionKind::Sum));
        let max = exprs.push(Value::Reduction(v, ReductionKind::Max));
        let sum2 = exprs.push(Value::Reduction(v, ReductionKind::Sum));
        assert!(!structurally_identical(&exprs, &NoEnv, sum, max));
        assert!(structurally_identical(&exprs, &NoEnv, sum, sum2));

        let tanh = exprs.push(Value::ActivationFunction(sum, "tanh".to_string()));
        let relu = exprs.push(Value::ActivationFunction(sum, "relu".to_string()));
        assert!(!structurally_identical(&exprs, &NoEnv, tanh, relu));
    }

    #[test]
    fn sharing_must_match() {
        let mut exprs = Expressions::new();
        let a = exprs.push(Value::RealConstant(1.0));
        let shared = exprs.push(Value::BinaryAdd(a, a));
        let b = exprs.push(Value::RealConstant(2.0));
        let c = exprs.push(Value::RealConstant(3.0));
        let separate = exprs.push(Value::BinaryAdd(b, c));
        assert!(!structurally_identical(&exprs, &NoEnv, shared, separate));
        assert!(!structurally_identical(&exprs, &NoEnv, separate, shared));
    }
}
