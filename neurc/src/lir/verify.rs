use crate::ir::Value;
use crate::ir::ValueId;
use crate::lir::Function;
use crate::lir::Statement;
use crate::lir::VariableId;
use anyhow::Result;
use std::collections::HashSet;

/// Variables visible at some point in the program.
struct Scopes {
    stack: Vec<HashSet<VariableId>>,
}

impl Scopes {
    fn is_defined(&self, var: VariableId) -> bool {
        self.stack.iter().any(|scope| scope.contains(&var))
    }
    fn define(&mut self, var: VariableId) {
        if let Some(scope) = self.stack.last_mut() {
            scope.insert(var);
        }
    }
}

impl Function {
    /// Verify that every variable is defined before it is read.
    ///
    /// A variable is defined by the function parameter, by an enclosing loop,
    /// by a `define` or by an earlier assignment, in the same scope or in an
    /// enclosing one.
    pub fn verify_definitions(&self) -> Result<()> {
        let mut scopes = Scopes {
            stack: vec![HashSet::from([self.input()])],
        };
        self.verify_statements(self.statements(), &mut scopes)
    }
    fn verify_statements(&self, statements: &[Statement], scopes: &mut Scopes) -> Result<()> {
        for statement in statements {
            match statement {
                Statement::Define(var) => scopes.define(*var),
                Statement::Assign(assignment) => {
                    self.verify_reads(assignment.rhs, scopes)?;
                    let target = match &self.values()[assignment.lhs] {
                        Value::Variable(var) => *var,
                        Value::IndexedValue(var, index) => {
                            self.verify_reads(*index, scopes)?;
                            *var
                        }
                        _ => {
                            let lhs = self.display_value(assignment.lhs);
                            return Err(anyhow::anyhow!("cannot assign to {lhs}"));
                        }
                    };
                    scopes.define(target);
                }
                Statement::Loop(l) => {
                    self.verify_reads(l.start, scopes)?;
                    self.verify_reads(l.end, scopes)?;
                    scopes.stack.push(HashSet::from([l.index]));
                    let result = self.verify_statements(&l.body, scopes);
                    scopes.stack.pop();
                    result?;
                }
            }
        }
        Ok(())
    }
    fn verify_reads(&self, value: ValueId, scopes: &Scopes) -> Result<()> {
        let read = match &self.values()[value] {
            Value::Variable(var) | Value::IndexedValue(var, _) => Some(*var),
            _ => None,
        };
        if let Some(var) = read {
            if !scopes.is_defined(var) {
                let name = self.variable(var).name();
                return Err(anyhow::anyhow!("{name} is read before it is defined"));
            }
        }
        for operand in self.values()[value].operands() {
            self.verify_reads(operand, scopes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::ScalarType;
    use crate::ir::Value;
    use crate::ir::ValueType;
    use crate::lir::Assignment;
    use crate::lir::ForLoop;
    use crate::lir::Function;
    use crate::lir::Statement;

    fn vector(len: usize) -> ValueType {
        ValueType::vector(ScalarType::Real, len)
    }

    #[test]
    fn reading_an_undefined_temporary_fails() {
        let mut function = Function::new(vector(1), vector(1));
        let t = function.declare("t0", ValueType::Real);
        let zero = function.push_value(Value::IntegerConstant(0));
        let lhs = function.push_value(Value::IndexedValue(function.output(), zero));
        let rhs = function.push_value(Value::Variable(t));
        function.push_statement(Statement::Assign(Assignment { lhs, rhs }));
        let err = function.verify_definitions().unwrap_err();
        assert_eq!(err.to_string(), "t0 is read before it is defined");
    }

    #[test]
    fn loop_variables_do_not_escape() {
        let mut function = Function::new(vector(1), vector(1));
        let idx = function.declare("idx0", ValueType::Integer);
        let t = function.declare("t0", ValueType::Real);
        let start = function.push_value(Value::IntegerConstant(0));
        let end = function.push_value(Value::IntegerConstant(1));
        let lhs = function.push_value(Value::Variable(t));
        let index = function.push_value(Value::Variable(idx));
        let rhs = function.push_value(Value::IndexedValue(function.input(), index));
        let body = vec![Statement::Assign(Assignment { lhs, rhs })];
        function.push_statement(Statement::Loop(ForLoop {
            index: idx,
            start,
            end,
            body,
        }));
        assert!(function.verify_definitions().is_ok());

        let zero = function.push_value(Value::IntegerConstant(0));
        let lhs = function.push_value(Value::IndexedValue(function.output(), zero));
        let rhs = function.push_value(Value::Variable(t));
        function.push_statement(Statement::Assign(Assignment { lhs, rhs }));
        assert!(function.verify_definitions().is_err());
    }
}
