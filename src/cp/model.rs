//! CP model definition.

use super::variables::{VarId, VarKind, Variable};
use std::ops::{Add, Mul, Neg, Sub};

/// A linear expression `sum(coef * var) + constant` over integer coefficients.
///
/// # Examples
///
/// ```
/// use u_groupform::cp::{CpModel, LinearExpr};
///
/// let mut model = CpModel::new("example");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// let expr = LinearExpr::from(a) + LinearExpr::from(b) * 3 - 1;
/// assert_eq!(expr.evaluate(&[1, 1]), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
    constant: i64,
}

impl LinearExpr {
    /// Creates the zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `coef * var` in place.
    pub fn add_term(&mut self, coef: i64, var: VarId) -> &mut Self {
        self.terms.push((var, coef));
        self
    }

    /// Adds a constant in place.
    pub fn add_constant(&mut self, value: i64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Raw `(var, coef)` terms. May contain repeated variables until normalized.
    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    /// Constant offset.
    pub fn constant(&self) -> i64 {
        self.constant
    }

    /// Evaluates the expression under a full assignment indexed by [`VarId`].
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(v, c)| c * values[v.index()])
                .sum::<i64>()
    }

    /// Merges repeated variables and drops zero coefficients.
    pub fn normalized(mut self) -> Self {
        self.terms.sort_by_key(|&(v, _)| v);
        let mut merged: Vec<(VarId, i64)> = Vec::with_capacity(self.terms.len());
        for (v, c) in self.terms {
            match merged.last_mut() {
                Some((last, acc)) if *last == v => *acc += c,
                _ => merged.push((v, c)),
            }
        }
        merged.retain(|&(_, c)| c != 0);
        self.terms = merged;
        self
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self {
            terms: vec![(var, 1)],
            constant: 0,
        }
    }
}

impl From<i64> for LinearExpr {
    fn from(constant: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }
}

impl From<i32> for LinearExpr {
    fn from(constant: i32) -> Self {
        Self::from(i64::from(constant))
    }
}

impl FromIterator<(i64, VarId)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (i64, VarId)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().map(|(c, v)| (v, c)).collect(),
            constant: 0,
        }
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        self + (-rhs.into())
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1
    }
}

impl Mul<i64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, factor: i64) -> LinearExpr {
        for (_, c) in &mut self.terms {
            *c *= factor;
        }
        self.constant *= factor;
        self
    }
}

/// Relation between the two sides of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `lhs <= rhs`
    Le,
    /// `lhs >= rhs`
    Ge,
    /// `lhs == rhs`
    Eq,
}

/// A linear constraint `sum(coef * var) <cmp> rhs`.
///
/// Constants from both sides are folded into `rhs` when the constraint is
/// added to a model.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Normalized `(var, coef)` terms.
    pub terms: Vec<(VarId, i64)>,
    /// Relation.
    pub cmp: Comparison,
    /// Right-hand side.
    pub rhs: i64,
}

impl Constraint {
    /// Whether a full assignment satisfies this constraint.
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        let lhs: i64 = self.terms.iter().map(|&(v, c)| c * values[v.index()]).sum();
        match self.cmp {
            Comparison::Le => lhs <= self.rhs,
            Comparison::Ge => lhs >= self.rhs,
            Comparison::Eq => lhs == self.rhs,
        }
    }
}

/// Objective function for the CP model.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize a linear expression.
    Minimize(LinearExpr),
    /// Maximize a linear expression.
    Maximize(LinearExpr),
}

impl Objective {
    /// The expression being optimized.
    pub fn expr(&self) -> &LinearExpr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }
}

/// A linear constraint model over bounded boolean and integer variables.
///
/// # Examples
///
/// ```
/// use u_groupform::cp::{CpModel, LinearExpr};
///
/// let mut model = CpModel::new("example");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// model.add_le(LinearExpr::from(a) + b, 1);
/// model.maximize(LinearExpr::from(a) * 2 + b);
/// assert!(model.validate().is_ok());
/// assert_eq!(model.constraint_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Declares a boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(Variable::boolean(name))
    }

    /// Declares an integer variable with domain `[min, max]`.
    pub fn new_int_var(&mut self, name: impl Into<String>, min: i64, max: i64) -> VarId {
        self.push_var(Variable::integer(name, min, max))
    }

    fn push_var(&mut self, var: Variable) -> VarId {
        self.variables.push(var);
        VarId(self.variables.len() - 1)
    }

    /// Adds `lhs <= rhs`.
    pub fn add_le(&mut self, lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) {
        self.add_relation(lhs.into(), Comparison::Le, rhs.into());
    }

    /// Adds `lhs >= rhs`.
    pub fn add_ge(&mut self, lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) {
        self.add_relation(lhs.into(), Comparison::Ge, rhs.into());
    }

    /// Adds `lhs == rhs`.
    pub fn add_eq(&mut self, lhs: impl Into<LinearExpr>, rhs: impl Into<LinearExpr>) {
        self.add_relation(lhs.into(), Comparison::Eq, rhs.into());
    }

    fn add_relation(&mut self, lhs: LinearExpr, cmp: Comparison, rhs: LinearExpr) {
        let diff = (lhs - rhs).normalized();
        self.constraints.push(Constraint {
            terms: diff.terms,
            cmp,
            rhs: -diff.constant,
        });
    }

    /// Sets the objective to maximize `expr`.
    pub fn maximize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some(Objective::Maximize(expr.into().normalized()));
    }

    /// Sets the objective to minimize `expr`.
    pub fn minimize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some(Objective::Minimize(expr.into().normalized()));
    }

    /// Declared variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Looks up a variable definition.
    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    /// All constraints in insertion order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The objective, if one has been set.
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Validates the model for consistency.
    ///
    /// Checks domains and that every referenced variable exists.
    pub fn validate(&self) -> Result<(), String> {
        for var in &self.variables {
            if var.min > var.max {
                return Err(format!(
                    "empty domain for {}: [{}, {}]",
                    var.name, var.min, var.max
                ));
            }
            if var.kind == VarKind::Bool && (var.min < 0 || var.max > 1) {
                return Err(format!("boolean {} has non-0/1 domain", var.name));
            }
        }
        let n = self.variables.len();
        for (idx, c) in self.constraints.iter().enumerate() {
            if let Some(&(v, _)) = c.terms.iter().find(|(v, _)| v.index() >= n) {
                return Err(format!("constraint {idx}: undefined variable #{}", v.index()));
            }
        }
        if let Some(objective) = &self.objective {
            if let Some(&(v, _)) = objective.expr().terms().iter().find(|(v, _)| v.index() >= n) {
                return Err(format!("objective: undefined variable #{}", v.index()));
            }
        }
        Ok(())
    }

    /// Returns the number of variables.
    pub fn var_count(&self) -> usize {
        self.variables.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
