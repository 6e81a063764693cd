//! Reading a solved model back into groups.

use super::entities::GroupingVars;
use crate::cp::CpSolution;
use crate::error::GroupingError;
use crate::preferences::PreferenceMatrix;

/// A partition of the students into groups, with the pair variables as the
/// solver reported them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupAssignment {
    group_of: Vec<usize>,
    groups: Vec<Vec<usize>>,
    together: Vec<bool>,
    in_group: Vec<bool>,
    fairness_bound: Option<i64>,
}

impl GroupAssignment {
    /// Extracts the assignment from `solution`.
    ///
    /// Fails when a student belongs to zero or several groups, or when a
    /// pair variable disagrees with the memberships.
    pub fn from_solution(vars: &GroupingVars, solution: &CpSolution) -> Result<Self, GroupingError> {
        let dims = vars.dims();
        if solution.values.is_empty() {
            return Err(inconsistent("solution carries no values".into()));
        }

        let mut group_of = Vec::with_capacity(dims.students);
        let mut groups = vec![Vec::new(); dims.groups];
        for i in vars.students() {
            let mut chosen = vars.groups().filter(|&k| solution.bool_value(vars.membership(i, k)));
            let (Some(k), None) = (chosen.next(), chosen.next()) else {
                return Err(inconsistent(format!(
                    "student {i} is not in exactly one group"
                )));
            };
            group_of.push(k);
            groups[k].push(i);
        }

        let mut together = Vec::with_capacity(dims.students * dims.students);
        let mut in_group = Vec::with_capacity(dims.students * dims.students * dims.groups);
        for i in vars.students() {
            for j in vars.students() {
                let x = solution.bool_value(vars.pair_together(i, j));
                if x != (group_of[i] == group_of[j]) {
                    return Err(inconsistent(format!(
                        "pair ({i}, {j}) disagrees with the memberships"
                    )));
                }
                together.push(x);
                for k in vars.groups() {
                    in_group.push(solution.bool_value(vars.pair_in_group(i, j, k)));
                }
            }
        }

        Ok(Self {
            group_of,
            groups,
            together,
            in_group,
            fairness_bound: vars.fairness_bound().and_then(|b| solution.try_value(b)),
        })
    }

    pub fn students(&self) -> usize {
        self.group_of.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Group index of `student`.
    pub fn group_of(&self, student: usize) -> usize {
        self.group_of[student]
    }

    /// Members of group `k` in ascending order.
    pub fn members(&self, k: usize) -> &[usize] {
        &self.groups[k]
    }

    /// All groups, each in ascending member order.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Reported `x_ij`.
    pub fn together(&self, i: usize, j: usize) -> bool {
        self.together[i * self.students() + j]
    }

    /// Reported `y_ijk`.
    pub fn pair_in_group(&self, i: usize, j: usize, k: usize) -> bool {
        self.in_group[(i * self.students() + j) * self.group_count() + k]
    }

    /// Reported fairness bound, in the fairness modes.
    pub fn fairness_bound(&self) -> Option<i64> {
        self.fairness_bound
    }

    /// `sum(P[i][j])` over ordered pairs inside group `k`, self-pairs included.
    pub fn group_score(&self, k: usize, preferences: &PreferenceMatrix) -> i64 {
        let members = self.members(k);
        members
            .iter()
            .flat_map(|&i| members.iter().map(move |&j| (i, j)))
            .map(|(i, j)| i64::from(preferences.get(i, j)))
            .sum()
    }

    /// Sum of all group scores.
    pub fn total_score(&self, preferences: &PreferenceMatrix) -> i64 {
        (0..self.group_count())
            .map(|k| self.group_score(k, preferences))
            .sum()
    }

    /// Lowest group score.
    pub fn min_group_score(&self, preferences: &PreferenceMatrix) -> i64 {
        (0..self.group_count())
            .map(|k| self.group_score(k, preferences))
            .min()
            .unwrap_or(0)
    }

    /// Lowest score among realized pairings `i != j`; `None` for singleton
    /// groups.
    pub fn min_realized_pair_score(&self, preferences: &PreferenceMatrix) -> Option<u8> {
        self.groups
            .iter()
            .flat_map(|members| {
                members
                    .iter()
                    .flat_map(move |&i| members.iter().map(move |&j| (i, j)))
            })
            .filter(|&(i, j)| i != j)
            .map(|(i, j)| preferences.get(i, j))
            .min()
    }
}

fn inconsistent(reason: String) -> GroupingError {
    GroupingError::InconsistentSolution { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{CpModel, SolverStatus};
    use crate::grouping::GroupingDims;

    fn matrix() -> PreferenceMatrix {
        PreferenceMatrix::from_rows(vec![
            vec![1, 5, 2, 2],
            vec![4, 1, 3, 2],
            vec![2, 2, 1, 5],
            vec![3, 3, 3, 1],
        ])
        .unwrap()
    }

    /// Builds a solution vector from a `group_of` table.
    fn solution_for(vars: &GroupingVars, model: &CpModel, group_of: &[usize]) -> CpSolution {
        let mut values = vec![0; model.var_count()];
        for i in vars.students() {
            values[vars.membership(i, group_of[i]).index()] = 1;
            for j in vars.students() {
                if group_of[i] == group_of[j] {
                    values[vars.pair_together(i, j).index()] = 1;
                    values[vars.pair_in_group(i, j, group_of[i]).index()] = 1;
                }
            }
        }
        CpSolution {
            status: SolverStatus::Optimal,
            objective_value: None,
            values,
            solve_time_ms: 0,
            nodes: 1,
        }
    }

    fn setup() -> (CpModel, GroupingVars) {
        let mut model = CpModel::new("assignment");
        let vars = GroupingVars::declare(&mut model, GroupingDims::new(4, 2));
        (model, vars)
    }

    #[test]
    fn test_read_back() {
        let (model, vars) = setup();
        let solution = solution_for(&vars, &model, &[0, 0, 1, 1]);
        let assignment = GroupAssignment::from_solution(&vars, &solution).unwrap();

        assert_eq!(assignment.groups(), &[vec![0, 1], vec![2, 3]]);
        assert_eq!(assignment.group_of(3), 1);
        assert!(assignment.together(0, 1));
        assert!(!assignment.together(0, 2));
        assert!(assignment.pair_in_group(2, 3, 1));
        assert!(!assignment.pair_in_group(2, 3, 0));
        assert_eq!(assignment.fairness_bound(), None);
    }

    #[test]
    fn test_scores() {
        let (model, vars) = setup();
        let prefs = matrix();
        let solution = solution_for(&vars, &model, &[0, 0, 1, 1]);
        let assignment = GroupAssignment::from_solution(&vars, &solution).unwrap();

        // {0,1}: 1 + 5 + 4 + 1, {2,3}: 1 + 5 + 3 + 1
        assert_eq!(assignment.group_score(0, &prefs), 11);
        assert_eq!(assignment.group_score(1, &prefs), 10);
        assert_eq!(assignment.total_score(&prefs), 21);
        assert_eq!(assignment.min_group_score(&prefs), 10);
        assert_eq!(assignment.min_realized_pair_score(&prefs), Some(3));
    }

    #[test]
    fn test_rejects_double_membership() {
        let (model, vars) = setup();
        let mut solution = solution_for(&vars, &model, &[0, 0, 1, 1]);
        solution.values[vars.membership(0, 1).index()] = 1;
        let err = GroupAssignment::from_solution(&vars, &solution).unwrap_err();
        assert!(matches!(err, GroupingError::InconsistentSolution { .. }));
    }

    #[test]
    fn test_rejects_stray_pair() {
        let (model, vars) = setup();
        let mut solution = solution_for(&vars, &model, &[0, 0, 1, 1]);
        solution.values[vars.pair_together(0, 3).index()] = 1;
        assert!(GroupAssignment::from_solution(&vars, &solution).is_err());
    }

    #[test]
    fn test_rejects_empty_solution() {
        let (_, vars) = setup();
        let solution = CpSolution::empty(SolverStatus::Infeasible);
        assert!(GroupAssignment::from_solution(&vars, &solution).is_err());
    }
}
