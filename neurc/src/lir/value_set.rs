use crate::ir::ScalarType;
use crate::ir::Value;
use crate::ir::ValueType;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueSetId(pub(crate) u32);

impl ValueSetId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for ValueSetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "vs{}", self.0)
    }
}

/// A literal stored in a [ValueSet].
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Integer(i64),
    Boolean(bool),
    Real(f64),
    RealVector(Vec<f64>),
}

impl Constant {
    pub fn from_value(value: &Value) -> Option<Constant> {
        match value {
            Value::IntegerConstant(v) => Some(Constant::Integer(*v)),
            Value::BooleanConstant(v) => Some(Constant::Boolean(*v)),
            Value::RealConstant(v) => Some(Constant::Real(*v)),
            Value::RealVectorConstant(v) => Some(Constant::RealVector(v.clone())),
            _ => None,
        }
    }
    pub fn typ(&self) -> ValueType {
        match self {
            Constant::Integer(_) => ValueType::Integer,
            Constant::Boolean(_) => ValueType::Boolean,
            Constant::Real(_) => ValueType::Real,
            Constant::RealVector(v) => ValueType::vector(ScalarType::Real, v.len()),
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Integer(v) => write!(f, "{v}"),
            Constant::Boolean(v) => write!(f, "{v}"),
            Constant::Real(v) => write!(f, "{v:?}"),
            Constant::RealVector(v) => write!(f, "{v:?}"),
        }
    }
}

/// Constants of the same type, one per neuron of an ensemble.
///
/// The set is addressed with the loop index of the ensemble, so slot `i`
/// holds the value for the neuron at layer position `first_index + i`.
#[derive(Debug, Clone)]
pub struct ValueSet {
    id: ValueSetId,
    element_type: ValueType,
    first_index: usize,
    values: Vec<Constant>,
}

impl ValueSet {
    pub(crate) fn new(id: ValueSetId, element_type: ValueType, first_index: usize) -> Self {
        ValueSet {
            id,
            element_type,
            first_index,
            values: vec![],
        }
    }
    pub fn id(&self) -> ValueSetId {
        self.id
    }
    pub fn element_type(&self) -> &ValueType {
        &self.element_type
    }
    pub fn first_index(&self) -> usize {
        self.first_index
    }
    pub fn values(&self) -> &[Constant] {
        &self.values
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// The value for loop index `index`.
    pub fn get(&self, index: usize) -> Option<&Constant> {
        index
            .checked_sub(self.first_index)
            .and_then(|slot| self.values.get(slot))
    }
    pub(crate) fn add_value(&mut self, value: Constant) -> usize {
        assert!(
            value.typ().structurally_equal(&self.element_type),
            "internal invariant violation: {} of type {} added to {} of type {}",
            value,
            value.typ(),
            self.id,
            self.element_type
        );
        self.values.push(value);
        self.values.len() - 1
    }
}

impl Display for ValueSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let values = self
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(
            f,
            "valueset {} : {} @ {} = {{ {values} }}",
            self.id, self.element_type, self.first_index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_relative_to_the_first_index() {
        let mut set = ValueSet::new(ValueSetId(0), ValueType::Real, 3);
        set.add_value(Constant::Real(0.5));
        set.add_value(Constant::Real(1.5));
        assert_eq!(set.get(3), Some(&Constant::Real(0.5)));
        assert_eq!(set.get(4), Some(&Constant::Real(1.5)));
        assert_eq!(set.get(2), None);
        assert_eq!(set.get(5), None);
        assert_eq!(set.to_string(), "valueset vs0 : [real] @ 3 = { 0.5, 1.5 }");
    }

    #[test]
    #[should_panic(expected = "internal invariant violation")]
    fn values_must_share_the_element_type() {
        let mut set = ValueSet::new(ValueSetId(1), ValueType::Real, 0);
        set.add_value(Constant::Boolean(true));
    }
}
