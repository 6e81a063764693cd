//! Error types for generation, model building, and solving.

use crate::cp::SolverStatus;
use crate::grouping::PolicyRule;
use thiserror::Error;

/// Errors surfaced by the group formation pipeline.
///
/// Configuration errors are raised before any solve attempt. Solve outcomes
/// (`Infeasible`, `SolveTimeout`, ...) are kept distinct so callers can tell
/// a contradictory rule set from an exhausted budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupingError {
    /// `students` is not a multiple of `groups`.
    #[error("{students} students cannot be split into {groups} equal groups")]
    IndivisibleGroups { students: usize, groups: usize },

    /// Zero groups, or more groups than students.
    #[error("invalid group count {groups} for {students} students")]
    InvalidGroupCount { students: usize, groups: usize },

    /// The preference bands need at least three students.
    #[error("at least {min} students are required, got {students}")]
    TooFewStudents { students: usize, min: usize },

    /// No draw can leave a leftover score inside `[1, 9]`.
    #[error(
        "points budget {points} is unreachable: leftover ranges over \
         [{min_leftover}, {max_leftover}], needs to hit [1, 9]"
    )]
    UnreachablePointsBudget {
        points: u32,
        min_leftover: i64,
        max_leftover: i64,
    },

    /// A generator setting is out of range.
    #[error("invalid generator setting `{field}`: {reason}")]
    InvalidGeneratorConfig { field: &'static str, reason: String },

    /// Rejection sampling hit its retry cap.
    #[error("row {row} not generated after {attempts} attempts")]
    GenerationExhausted { row: usize, attempts: usize },

    /// A supplied preference matrix breaks an invariant.
    #[error("invalid preference matrix: {reason}")]
    InvalidPreferences { reason: String },

    /// Policy settings or attribute tables do not fit the problem.
    #[error("invalid policy configuration: {reason}")]
    InvalidPolicy { reason: String },

    /// The solver proved that no assignment satisfies the model.
    #[error("model is infeasible{}", conflict_suffix(.conflicting_rule))]
    Infeasible {
        /// First policy rule whose addition made the model infeasible, when
        /// the conflict could be traced to one.
        conflicting_rule: Option<PolicyRule>,
    },

    /// The time budget expired before any assignment was found.
    #[error("no assignment found{}", budget_suffix(.time_limit_ms))]
    SolveTimeout {
        /// Configured budget; `None` when the solver timed out on its own.
        time_limit_ms: Option<u64>,
    },

    /// The solver rejected the model.
    #[error("solver rejected the model: {reason}")]
    ModelInvalid { reason: String },

    /// Any other solver outcome without a usable assignment.
    #[error("solver finished with status {status:?}")]
    SolverFailure { status: SolverStatus },

    /// The returned assignment is not a partition of the students.
    #[error("inconsistent solution: {reason}")]
    InconsistentSolution { reason: String },
}

fn conflict_suffix(rule: &Option<PolicyRule>) -> String {
    match rule {
        Some(rule) => format!(" once policy rule {} ({rule}) is enabled", rule.level()),
        None => String::new(),
    }
}

fn budget_suffix(time_limit_ms: &Option<u64>) -> String {
    match time_limit_ms {
        Some(ms) => format!(" within {ms} ms"),
        None => String::new(),
    }
}

impl GroupingError {
    /// Whether the error was raised while validating inputs, before solving.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            GroupingError::IndivisibleGroups { .. }
                | GroupingError::InvalidGroupCount { .. }
                | GroupingError::TooFewStudents { .. }
                | GroupingError::UnreachablePointsBudget { .. }
                | GroupingError::InvalidGeneratorConfig { .. }
                | GroupingError::GenerationExhausted { .. }
                | GroupingError::InvalidPreferences { .. }
                | GroupingError::InvalidPolicy { .. }
        )
    }
}
