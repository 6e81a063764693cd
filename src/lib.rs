//! Preference-driven formation of equal-size student groups.
//!
//! Provides:
//!
//! - **Preferences**: Synthetic pairwise preference matrices where every
//!   student distributes a fixed budget of points, generated by seeded
//!   rejection sampling.
//! - **Grouping**: A 0-1 integer model that partitions students into equal
//!   groups under one of three objectives (total satisfaction, group
//!   fairness, individual fairness), plus a cumulative ladder of policy
//!   rules over personality and experience attributes.
//! - **CP (Constraint Programming)**: The modeling layer the grouping
//!   model is expressed in, with a bundled exact branch-and-bound solver
//!   behind the [`cp::CpSolver`] trait.
//!
//! # Architecture
//!
//! `preferences` produces data, `grouping` turns data into a [`cp::CpModel`]
//! and back, and `cp` knows nothing about students or groups. Errors from
//! every layer are reported as [`GroupingError`].

pub mod cp;
pub mod error;
pub mod grouping;
pub mod preferences;

pub use error::GroupingError;
