use crate::error::TypeError;
use std::cmp::min;
use std::fmt::Display;
use std::fmt::Formatter;

/// Element types that may appear on their own or inside a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Boolean,
    Integer,
    Real,
}

impl ScalarType {
    /// Join two scalar types for a binary operator.
    ///
    /// Integers widen to reals. Nothing ever narrows.
    pub fn join(self, other: ScalarType) -> Option<ScalarType> {
        use ScalarType::*;
        match (self, other) {
            (Boolean, Boolean) => Some(Boolean),
            (Real, Real) | (Real, Integer) | (Integer, Real) => Some(Real),
            (Integer, Integer) => Some(Integer),
            _ => None,
        }
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::Boolean => write!(f, "[bool]"),
            ScalarType::Integer => write!(f, "[int]"),
            ScalarType::Real => write!(f, "[real]"),
        }
    }
}

/// The type of a [crate::ir::Value].
///
/// Vectors only hold scalars; a vector of vectors cannot be expressed. The
/// length of a vector is optional because some producers (for example
/// joining a vector with a scalar) do not constrain it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Integer,
    Real,
    Vector(ScalarType, Option<u32>),
}

impl ValueType {
    pub fn vector(elem: ScalarType, len: usize) -> ValueType {
        ValueType::Vector(elem, Some(len as u32))
    }
    pub fn is_scalar(&self) -> bool {
        self.as_scalar().is_some()
    }
    pub fn is_vector(&self) -> bool {
        matches!(self, ValueType::Vector(_, _))
    }
    pub fn as_scalar(&self) -> Option<ScalarType> {
        match self {
            ValueType::Boolean => Some(ScalarType::Boolean),
            ValueType::Integer => Some(ScalarType::Integer),
            ValueType::Real => Some(ScalarType::Real),
            ValueType::Vector(_, _) => None,
        }
    }
    /// Element type of a vector, or the type itself for a scalar.
    pub fn element(&self) -> ScalarType {
        match self {
            ValueType::Boolean => ScalarType::Boolean,
            ValueType::Integer => ScalarType::Integer,
            ValueType::Real => ScalarType::Real,
            ValueType::Vector(elem, _) => *elem,
        }
    }
    pub fn len(&self) -> Option<u32> {
        match self {
            ValueType::Vector(_, len) => *len,
            _ => None,
        }
    }
    /// Compare the shape of two types.
    ///
    /// Vector lengths are not compared, only the kind and the element type.
    pub fn structurally_equal(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Vector(a, _), ValueType::Vector(b, _)) => a == b,
            (a, b) => a.as_scalar().is_some() && a.as_scalar() == b.as_scalar(),
        }
    }
    /// Result type of a binary arithmetic operator applied to `self` and `other`.
    ///
    /// If either side is a vector, the element types are joined and the
    /// result is a vector whose length is the shortest known length.
    pub fn join(&self, other: &ValueType) -> Result<ValueType, TypeError> {
        let incompatible = || TypeError::IncompatibleOperands {
            lhs: self.clone(),
            rhs: other.clone(),
        };
        let elem = self.element().join(other.element()).ok_or_else(incompatible)?;
        if !self.is_vector() && !other.is_vector() {
            return Ok(elem.into());
        }
        let len = match (self.len(), other.len()) {
            (Some(a), Some(b)) => Some(min(a, b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        };
        Ok(ValueType::Vector(elem, len))
    }
}

impl From<ScalarType> for ValueType {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Boolean => ValueType::Boolean,
            ScalarType::Integer => ValueType::Integer,
            ScalarType::Real => ValueType::Real,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Vector(elem, Some(len)) => write!(f, "[ Vector {elem}, {len} ]"),
            ValueType::Vector(elem, None) => write!(f, "[ Vector {elem} ]"),
            scalar => write!(f, "{}", scalar.element()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SCALARS: [ValueType; 3] = [ValueType::Boolean, ValueType::Integer, ValueType::Real];

    #[test]
    fn join_is_commutative_where_defined() {
        for a in ALL_SCALARS.iter() {
            for b in ALL_SCALARS.iter() {
                match (a.join(b), b.join(a)) {
                    (Ok(ab), Ok(ba)) => assert_eq!(ab, ba),
                    (Err(_), Err(_)) => (),
                    _ => panic!("join of {a} and {b} is not symmetric"),
                }
            }
        }
    }

    #[test]
    fn join_widens_but_never_narrows() {
        assert_eq!(ValueType::Real.join(&ValueType::Integer).unwrap(), ValueType::Real);
        assert_eq!(ValueType::Integer.join(&ValueType::Integer).unwrap(), ValueType::Integer);
        assert_eq!(ValueType::Boolean.join(&ValueType::Boolean).unwrap(), ValueType::Boolean);
        assert!(matches!(
            ValueType::Boolean.join(&ValueType::Real),
            Err(TypeError::IncompatibleOperands { .. })
        ));
        assert!(ValueType::Integer.join(&ValueType::Boolean).is_err());
    }

    #[test]
    fn join_lifts_through_vectors() {
        let v3 = ValueType::vector(ScalarType::Real, 3);
        let v2 = ValueType::vector(ScalarType::Integer, 2);
        assert_eq!(v3.join(&v2).unwrap(), ValueType::vector(ScalarType::Real, 2));
        assert_eq!(
            v2.join(&ValueType::Real).unwrap(),
            ValueType::vector(ScalarType::Real, 2)
        );
        let unsized_vec = ValueType::Vector(ScalarType::Real, None);
        assert_eq!(unsized_vec.join(&v3).unwrap(), v3);
        assert!(ValueType::vector(ScalarType::Boolean, 2).join(&v3).is_err());
    }

    #[test]
    fn structural_equality_ignores_length() {
        let a = ValueType::vector(ScalarType::Real, 3);
        let b = ValueType::vector(ScalarType::Real, 7);
        assert!(a.structurally_equal(&b));
        assert!(!a.structurally_equal(&ValueType::vector(ScalarType::Integer, 3)));
        assert!(!a.structurally_equal(&ValueType::Real));
        assert!(ValueType::Real.structurally_equal(&ValueType::Real));
        assert!(!ValueType::Real.structurally_equal(&ValueType::Integer));
    }

    #[test]
    fn display() {
        assert_eq!(ValueType::Real.to_string(), "[real]");
        assert_eq!(
            ValueType::vector(ScalarType::Real, 2).to_string(),
            "[ Vector [real], 2 ]"
        );
        assert_eq!(
            ValueType::Vector(ScalarType::Boolean, None).to_string(),
            "[ Vector [bool] ]"
        );
    }
}
