//! Constraint Programming (CP) modeling layer.
//!
//! Provides a domain-agnostic model for expressing 0-1 and bounded-integer
//! linear optimization problems, plus a reference solver.
//!
//! # Key Components
//!
//! - **Variables**: [`Variable`], [`VarId`] — bounded decision variables
//! - **Expressions**: [`LinearExpr`] — integer linear combinations
//! - **Constraints**: [`Constraint`] — `<=`, `>=`, `==` over linear expressions
//! - **Model**: [`CpModel`] — container for variables, constraints, objective
//! - **Linearization**: [`add_and`] — conjunction of booleans as linear rows
//! - **Solver**: [`CpSolver`] trait — interface for solver implementations
//!
//! # Design
//!
//! The [`CpSolver`] trait allows plugging in external engines. The bundled
//! [`BranchAndBoundSolver`] is complete and exact but only intended for
//! small models such as classroom-size group assignments.
//!
//! # References
//!
//! Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

mod linearize;
mod model;
mod solver;
mod variables;

pub use linearize::add_and;
pub use model::{Comparison, Constraint, CpModel, LinearExpr, Objective};
pub use solver::{BranchAndBoundSolver, CpSolution, CpSolver, SolverConfig, SolverStatus};
pub use variables::{VarId, VarKind, Variable};
