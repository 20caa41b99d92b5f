use crate::ir::ValueId;
use crate::lir::VariableId;

/// `lhs = rhs`, where `lhs` is a variable or an indexed variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub lhs: ValueId,
    pub rhs: ValueId,
}

/// Runs `body` for `index` in `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub index: VariableId,
    pub start: ValueId,
    pub end: ValueId,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Brings a vector variable into scope before it is filled element-wise.
    Define(VariableId),
    Assign(Assignment),
    Loop(ForLoop),
}

impl Statement {
    /// Loops directly in `statements`, not counting nested ones.
    pub fn loops(statements: &[Statement]) -> impl Iterator<Item = &ForLoop> {
        statements.iter().filter_map(|stmt| match stmt {
            Statement::Loop(l) => Some(l),
            _ => None,
        })
    }
}
