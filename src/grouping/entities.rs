//! Decision variable families of the grouping model.

use crate::cp::{CpModel, VarId};

/// Problem dimensions: `students` split into `groups` equal groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupingDims {
    /// Number of students `N`.
    pub students: usize,
    /// Number of groups `K`.
    pub groups: usize,
}

impl GroupingDims {
    pub fn new(students: usize, groups: usize) -> Self {
        Self { students, groups }
    }

    /// Required size of every group (`N / K`, exact when [`is_divisible`](Self::is_divisible)).
    pub fn group_size(&self) -> usize {
        self.students / self.groups
    }

    /// Whether `N` splits into `K` equal groups.
    pub fn is_divisible(&self) -> bool {
        self.groups > 0 && self.students % self.groups == 0
    }
}

/// Handles to every variable of a grouping model.
///
/// | Family | Meaning |
/// |---|---|
/// | `membership(i, k)` | student `i` is in group `k` |
/// | `pair_together(i, j)` | `i` and `j` share a group |
/// | `pair_in_group(i, j, k)` | `i` and `j` are both in group `k` |
/// | `fairness_bound()` | worst-off group/pair level (fairness modes only) |
///
/// Memberships are declared first: they are the primary decisions and the
/// other families follow from them by propagation.
#[derive(Debug, Clone)]
pub struct GroupingVars {
    dims: GroupingDims,
    membership: Vec<VarId>,
    pair_together: Vec<VarId>,
    pair_in_group: Vec<VarId>,
    fairness_bound: Option<VarId>,
}

impl GroupingVars {
    /// Declares the three boolean families on `model`.
    pub fn declare(model: &mut CpModel, dims: GroupingDims) -> Self {
        let (n, k) = (dims.students, dims.groups);

        let mut membership = Vec::with_capacity(n * k);
        for i in 0..n {
            for g in 0..k {
                membership.push(model.new_bool_var(format!("x_ik[{},{}]", i + 1, g + 1)));
            }
        }

        let mut pair_together = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                pair_together.push(model.new_bool_var(format!("x_ij[{},{}]", i + 1, j + 1)));
            }
        }

        let mut pair_in_group = Vec::with_capacity(n * n * k);
        for i in 0..n {
            for j in 0..n {
                for g in 0..k {
                    pair_in_group.push(
                        model.new_bool_var(format!("y_ijk[{},{},{}]", i + 1, j + 1, g + 1)),
                    );
                }
            }
        }

        Self {
            dims,
            membership,
            pair_together,
            pair_in_group,
            fairness_bound: None,
        }
    }

    /// Declares the fairness bound `[0, max]`. Idempotent.
    pub(crate) fn declare_fairness_bound(&mut self, model: &mut CpModel, max: i64) -> VarId {
        *self
            .fairness_bound
            .get_or_insert_with(|| model.new_int_var("lowerbound", 0, max))
    }

    pub fn dims(&self) -> GroupingDims {
        self.dims
    }

    pub fn membership(&self, student: usize, group: usize) -> VarId {
        self.membership[student * self.dims.groups + group]
    }

    pub fn pair_together(&self, i: usize, j: usize) -> VarId {
        self.pair_together[i * self.dims.students + j]
    }

    pub fn pair_in_group(&self, i: usize, j: usize, group: usize) -> VarId {
        self.pair_in_group[(i * self.dims.students + j) * self.dims.groups + group]
    }

    pub fn fairness_bound(&self) -> Option<VarId> {
        self.fairness_bound
    }

    /// Student indices `0..N`.
    pub fn students(&self) -> std::ops::Range<usize> {
        0..self.dims.students
    }

    /// Group indices `0..K`.
    pub fn groups(&self) -> std::ops::Range<usize> {
        0..self.dims.groups
    }
}
