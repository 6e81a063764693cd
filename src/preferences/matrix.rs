//! Square preference matrix.

use crate::error::GroupingError;

/// Lowest score a student can give.
pub const MIN_SCORE: u8 = 1;
/// Highest score a student can give.
pub const MAX_SCORE: u8 = 9;
/// Fixed score every student gives themself.
pub const SELF_SCORE: u8 = 1;

/// `N × N` preference scores, `scores[giver][receiver]`.
///
/// Invariants (checked on construction):
/// - the diagonal is [`SELF_SCORE`]
/// - every entry lies in `[MIN_SCORE, MAX_SCORE]`
/// - every row sums to the same budget ([`points_per_row`](Self::points_per_row))
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PreferenceMatrix {
    size: usize,
    scores: Vec<u8>,
    points_per_row: u32,
}

impl PreferenceMatrix {
    /// Builds a matrix from explicit rows, validating every invariant.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_groupform::preferences::PreferenceMatrix;
    ///
    /// let m = PreferenceMatrix::from_rows(vec![
    ///     vec![1, 4, 2],
    ///     vec![3, 1, 3],
    ///     vec![5, 1, 1],
    /// ])
    /// .unwrap();
    /// assert_eq!(m.points_per_row(), 7);
    /// assert_eq!(m.get(0, 1), 4);
    /// ```
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, GroupingError> {
        let size = rows.len();
        if size == 0 {
            return Err(invalid("matrix is empty".into()));
        }
        let mut points_per_row = None;
        let mut scores = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(invalid(format!(
                    "row {i} has {} entries, expected {size}",
                    row.len()
                )));
            }
            if row[i] != SELF_SCORE {
                return Err(invalid(format!(
                    "row {i} gives itself {}, expected {SELF_SCORE}",
                    row[i]
                )));
            }
            if let Some((j, &s)) = row
                .iter()
                .enumerate()
                .find(|&(_, &s)| !(MIN_SCORE..=MAX_SCORE).contains(&s))
            {
                return Err(invalid(format!("entry ({i}, {j}) = {s} is out of range")));
            }
            let sum: u32 = row.iter().map(|&s| u32::from(s)).sum();
            match points_per_row {
                None => points_per_row = Some(sum),
                Some(p) if p != sum => {
                    return Err(invalid(format!("row {i} sums to {sum}, expected {p}")));
                }
                Some(_) => {}
            }
            scores.extend(row);
        }
        Ok(Self {
            size,
            scores,
            points_per_row: points_per_row.unwrap_or(0),
        })
    }

    /// Number of students.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Score that `giver` assigns to `receiver`.
    pub fn get(&self, giver: usize, receiver: usize) -> u8 {
        self.scores[giver * self.size + receiver]
    }

    /// All scores given by one student.
    pub fn row(&self, giver: usize) -> &[u8] {
        &self.scores[giver * self.size..(giver + 1) * self.size]
    }

    /// Iterates over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.scores.chunks(self.size)
    }

    /// Common row sum.
    pub fn points_per_row(&self) -> u32 {
        self.points_per_row
    }

    /// Largest entry in the matrix.
    pub fn max_score(&self) -> u8 {
        self.scores.iter().copied().max().unwrap_or(MIN_SCORE)
    }

    /// Sum of all entries.
    pub fn total(&self) -> u64 {
        self.scores.iter().map(|&s| u64::from(s)).sum()
    }
}

fn invalid(reason: String) -> GroupingError {
    GroupingError::InvalidPreferences { reason }
}
