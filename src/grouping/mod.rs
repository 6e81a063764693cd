//! Equal-size group formation as a 0-1 program.
//!
//! Splits `N` students into `K` groups of `N / K` so that a chosen
//! objective over pairwise preferences is maximized.
//!
//! # Key Components
//!
//! - **Variables**: [`GroupingVars`] — memberships `x_ik`, pairings `x_ij`,
//!   pairings-in-group `y_ijk`, and an optional fairness bound
//! - **Structure**: [`add_structural_constraints`] — partition, equal sizes,
//!   symmetry, and the `y = x AND x` links
//! - **Objectives**: [`ObjectiveMode`] — total satisfaction, group fairness,
//!   or individual fairness
//! - **Policies**: [`PolicyConfig`], [`PolicyRule`] — cumulative rule ladder
//!   over [`AttributeTable`] and [`ExperienceTable`]
//! - **Execution**: [`GroupingRunner`] — build, solve, read back into a
//!   [`GroupAssignment`], and name the rule behind an infeasible model
//!
//! # Examples
//!
//! ```
//! use u_groupform::grouping::{GroupingProblem, GroupingRunner, ObjectiveMode};
//! use u_groupform::preferences::{GeneratorConfig, PreferenceGenerator};
//!
//! let generator = PreferenceGenerator::new(GeneratorConfig::new(6).with_seed(42)).unwrap();
//! let problem = GroupingProblem::new(generator.generate().unwrap(), 2)
//!     .with_mode(ObjectiveMode::GroupFairness);
//!
//! let result = GroupingRunner::run(&problem).unwrap();
//! assert_eq!(result.assignment.groups().len(), 2);
//! assert!(result.assignment.groups().iter().all(|g| g.len() == 3));
//! ```

mod assignment;
mod attributes;
mod constraints;
mod entities;
mod objective;
mod policy;
mod problem;
mod runner;

pub use assignment::GroupAssignment;
pub use attributes::{AttributeTable, ExperienceTable};
pub use constraints::{
    add_group_size, add_partition, add_reflexivity, add_self_pair_count,
    add_structural_constraints, add_symmetry, link_pair_in_group,
};
pub use entities::{GroupingDims, GroupingVars};
pub use objective::ObjectiveMode;
pub use policy::{PolicyConfig, PolicyRule};
pub use problem::{GroupingModel, GroupingProblem};
pub use runner::{GroupingResult, GroupingRunner};
