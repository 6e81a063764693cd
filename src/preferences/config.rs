//! Generator configuration.

use super::matrix::{MAX_SCORE, MIN_SCORE, SELF_SCORE};
use crate::error::GroupingError;

/// Inclusive score band for mild preferences.
pub const MILD_BAND: (u8, u8) = (1, 5);
/// Inclusive score band for strong preferences.
pub const STRONG_BAND: (u8, u8) = (6, 9);
/// Smallest class the bands can describe.
pub const MIN_STUDENTS: usize = 3;

/// Configuration for the synthetic preference generator.
///
/// Each row draws `floor(0.6 * N)` mild scores and `N - 2 - floor(0.6 * N)`
/// strong scores; the remaining budget becomes one more score and the
/// student's own entry is fixed at 1.
///
/// # Examples
///
/// ```
/// use u_groupform::preferences::GeneratorConfig;
///
/// let config = GeneratorConfig::new(9).with_seed(10);
/// assert_eq!(config.points_to_give(), 34);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    /// Number of students (matrix side).
    pub students: usize,

    /// Row budget. `None` derives it from `students`
    /// (see [`default_points_to_give`]).
    pub points_to_give: Option<u32>,

    /// Rejection-sampling cap per row.
    pub max_attempts_per_row: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Creates a configuration for `students` with the derived budget.
    pub fn new(students: usize) -> Self {
        Self {
            students,
            points_to_give: None,
            max_attempts_per_row: 100_000,
            seed: None,
        }
    }

    pub fn with_points_to_give(mut self, points: u32) -> Self {
        self.points_to_give = Some(points);
        self
    }

    pub fn with_max_attempts_per_row(mut self, n: usize) -> Self {
        self.max_attempts_per_row = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Effective row budget.
    pub fn points_to_give(&self) -> u32 {
        self.points_to_give
            .unwrap_or_else(|| default_points_to_give(self.students))
    }

    /// Number of scores drawn from the mild band per row.
    pub fn mild_count(&self) -> usize {
        self.students * 3 / 5
    }

    /// Number of scores drawn from the strong band per row.
    pub fn strong_count(&self) -> usize {
        self.students.saturating_sub(2 + self.mild_count())
    }

    /// Range `[min, max]` the leftover score can take over all draws.
    pub fn leftover_range(&self) -> (i64, i64) {
        let mild = self.mild_count() as i64;
        let strong = self.strong_count() as i64;
        let min_sum = mild * i64::from(MILD_BAND.0) + strong * i64::from(STRONG_BAND.0);
        let max_sum = mild * i64::from(MILD_BAND.1) + strong * i64::from(STRONG_BAND.1);
        let free = i64::from(self.points_to_give()) - i64::from(SELF_SCORE);
        (free - max_sum, free - min_sum)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GroupingError> {
        if self.students < MIN_STUDENTS {
            return Err(GroupingError::TooFewStudents {
                students: self.students,
                min: MIN_STUDENTS,
            });
        }
        let (min_leftover, max_leftover) = self.leftover_range();
        if max_leftover < i64::from(MIN_SCORE) || min_leftover > i64::from(MAX_SCORE) {
            return Err(GroupingError::UnreachablePointsBudget {
                points: self.points_to_give(),
                min_leftover,
                max_leftover,
            });
        }
        if self.max_attempts_per_row == 0 {
            return Err(GroupingError::InvalidGeneratorConfig {
                field: "max_attempts_per_row",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Budget that centers the leftover score for a class of `students`:
/// `trunc(2.5 * m + 7.5 * (N - 2 - m) + 1 + 5.5)` with `m = floor(0.6 * N)`.
pub fn default_points_to_give(students: usize) -> u32 {
    let mild = students * 3 / 5;
    let strong = students.saturating_sub(2 + mild);
    // Doubled to stay in integers: 5m + 15s + 13, halved with truncation.
    ((5 * mild + 15 * strong + 13) / 2) as u32
}
