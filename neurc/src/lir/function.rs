use crate::error::TypeError;
use crate::ir::Expressions;
use crate::ir::TypeEnv;
use crate::ir::Value;
use crate::ir::ValueId;
use crate::ir::ValueType;
use crate::lir::Assignment;
use crate::lir::ForLoop;
use crate::lir::Statement;
use crate::lir::ValueSet;
use crate::lir::ValueSetId;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(u32);

impl VariableId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for VariableId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "var{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    typ: ValueType,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn typ(&self) -> &ValueType {
        &self.typ
    }
}

/// The forward computation of a whole network.
///
/// Reads the vector `input` and writes the vector `output`. Constants that
/// differ per neuron are stored in [ValueSet]s.
#[derive(Debug)]
pub struct Function {
    input: VariableId,
    output: VariableId,
    variables: Vec<Variable>,
    values: Expressions,
    value_sets: Vec<ValueSet>,
    statements: Vec<Statement>,
}

impl Function {
    pub(crate) fn new(input: ValueType, output: ValueType) -> Self {
        let mut function = Function {
            input: VariableId(0),
            output: VariableId(0),
            variables: vec![],
            values: Expressions::new(),
            value_sets: vec![],
            statements: vec![],
        };
        function.input = function.declare("input", input);
        function.output = function.declare("output", output);
        function
    }
    pub fn input(&self) -> VariableId {
        self.input
    }
    pub fn output(&self) -> VariableId {
        self.output
    }
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
    pub fn values(&self) -> &Expressions {
        &self.values
    }
    pub fn value_sets(&self) -> &[ValueSet] {
        &self.value_sets
    }
    pub fn value_set(&self, id: ValueSetId) -> &ValueSet {
        &self.value_sets[id.index()]
    }
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
    pub fn infer_type(&self, value: ValueId) -> Result<ValueType, TypeError> {
        self.values.infer_type(value, self)
    }
    pub(crate) fn declare(&mut self, name: &str, typ: ValueType) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(Variable {
            name: name.to_string(),
            typ,
        });
        id
    }
    pub(crate) fn push_value(&mut self, value: Value) -> ValueId {
        self.values.push(value)
    }
    pub(crate) fn create_value_set(&mut self, element_type: ValueType, first_index: usize) -> ValueSetId {
        let id = ValueSetId(self.value_sets.len() as u32);
        self.value_sets
            .push(ValueSet::new(id, element_type, first_index));
        id
    }
    pub(crate) fn value_set_mut(&mut self, id: ValueSetId) -> &mut ValueSet {
        &mut self.value_sets[id.index()]
    }
    pub(crate) fn push_statement(&mut self, statement: Statement) {
        self.statements.push(statement);
    }
    /// Type check every statement.
    pub fn check_types(&self) -> Result<(), TypeError> {
        self.check_statements(&self.statements)
    }
    fn check_statements(&self, statements: &[Statement]) -> Result<(), TypeError> {
        for statement in statements {
            match statement {
                Statement::Define(_) => (),
                Statement::Assign(assignment) => self.check_assignment(assignment)?,
                Statement::Loop(l) => self.check_loop(l)?,
            }
        }
        Ok(())
    }
    fn check_assignment(&self, assignment: &Assignment) -> Result<(), TypeError> {
        let lhs = self.infer_type(assignment.lhs)?;
        let rhs = self.infer_type(assignment.rhs)?;
        if !lhs.structurally_equal(&rhs) {
            return Err(TypeError::AssignmentTypeMismatch { lhs, rhs });
        }
        // Binding a whole row of a value set is the only vector assignment.
        let row_binding = matches!(self.values[assignment.rhs], Value::GetValue(_, _));
        if !lhs.is_scalar() && !row_binding {
            return Err(TypeError::AssignmentRequiresScalar(lhs));
        }
        if !self.values[assignment.lhs].is_lvalue() {
            return Err(TypeError::NotAnLValue);
        }
        Ok(())
    }
    fn check_loop(&self, l: &ForLoop) -> Result<(), TypeError> {
        for bound in [l.start, l.end] {
            let typ = self.infer_type(bound)?;
            if !typ.is_scalar() {
                return Err(TypeError::LoopBoundMustBeScalar(typ));
            }
        }
        self.check_statements(&l.body)
    }
    /// Render `value` as a single expression.
    pub fn display_value(&self, value: ValueId) -> String {
        match &self.values[value] {
            Value::IntegerConstant(v) => v.to_string(),
            Value::BooleanConstant(v) => v.to_string(),
            Value::RealConstant(v) => format!("{v:?}"),
            Value::RealVectorConstant(v) => format!("{v:?}"),
            Value::Variable(var) => self.variable(*var).name().to_string(),
            Value::IndexedValue(var, index) => {
                format!("{}[{}]", self.variable(*var).name(), self.display_value(*index))
            }
            Value::GetValue(set, index) => {
                format!("getvalue({set}, {})", self.display_value(*index))
            }
            other => {
                let operands = other
                    .operands()
                    .into_iter()
                    .map(|x| self.display_value(x))
                    .collect::<Vec<String>>()
                    .join(", ");
                format!("{}({operands})", other.mnemonic())
            }
        }
    }
    fn display_statements(
        &self,
        f: &mut Formatter<'_>,
        statements: &[Statement],
        indent: usize,
    ) -> std::fmt::Result {
        let tabs = "\t".repeat(indent);
        for statement in statements {
            match statement {
                Statement::Define(var) => {
                    let var = self.variable(*var);
                    writeln!(f, "{tabs}define {}\t{}", var.name(), var.typ())?;
                }
                Statement::Assign(assignment) => {
                    let typ = match self.infer_type(assignment.lhs) {
                        Ok(typ) => typ.to_string(),
                        Err(_) => "<invalid>".to_string(),
                    };
                    writeln!(
                        f,
                        "{tabs}{} = {}\t{typ}",
                        self.display_value(assignment.lhs),
                        self.display_value(assignment.rhs)
                    )?;
                }
                Statement::Loop(l) => {
                    writeln!(
                        f,
                        "{tabs}for {} = {} : {} {{",
                        self.variable(l.index).name(),
                        self.display_value(l.start),
                        self.display_value(l.end)
                    )?;
                    self.display_statements(f, &l.body, indent + 1)?;
                    writeln!(f, "{tabs}}}")?;
                }
            }
        }
        Ok(())
    }
}

impl TypeEnv for Function {
    fn variable_type(&self, var: VariableId) -> ValueType {
        self.variable(var).typ().clone()
    }
    fn value_set_type(&self, set: ValueSetId) -> ValueType {
        self.value_set(set).element_type().clone()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let input = self.variable(self.input);
        let output = self.variable(self.output);
        writeln!(
            f,
            "function ({} {}) -> ({} {})",
            input.name(),
            input.typ(),
            output.name(),
            output.typ()
        )?;
        for set in self.value_sets.iter() {
            writeln!(f, "{set}")?;
        }
        self.display_statements(f, &self.statements, 0)
    }
}
