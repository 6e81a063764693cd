//! CP variable types.

/// Handle to a decision variable inside a [`CpModel`](super::CpModel).
///
/// Handles are dense indices in declaration order and are only meaningful
/// for the model that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarKind {
    /// 0/1 variable.
    Bool,
    /// Bounded integer variable.
    Int,
}

/// A declared decision variable with a closed domain `[min, max]`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// Variable name (diagnostics only; not required to be unique).
    pub name: String,
    /// Variable kind.
    pub kind: VarKind,
    /// Minimum value.
    pub min: i64,
    /// Maximum value.
    pub max: i64,
}

impl Variable {
    /// Creates a boolean variable with domain `[0, 1]`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Bool,
            min: 0,
            max: 1,
        }
    }

    /// Creates an integer variable with the given bounds.
    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Int,
            min,
            max,
        }
    }

    /// Whether this variable is fixed to a single value.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Domain size (max - min + 1).
    pub fn domain_size(&self) -> i64 {
        self.max - self.min + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_domain() {
        let v = Variable::boolean("b");
        assert_eq!(v.kind, VarKind::Bool);
        assert_eq!((v.min, v.max), (0, 1));
        assert_eq!(v.domain_size(), 2);
        assert!(!v.is_fixed());
    }

    #[test]
    fn test_integer_fixed() {
        let v = Variable::integer("x", 7, 7);
        assert!(v.is_fixed());
        assert_eq!(v.domain_size(), 1);
    }

    #[test]
    fn test_var_id_index() {
        assert_eq!(VarId(3).index(), 3);
        assert!(VarId(1) < VarId(2));
    }
}
