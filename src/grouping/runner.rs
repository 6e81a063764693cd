//! Solve loop: build, solve, read back, diagnose.

use super::assignment::GroupAssignment;
use super::objective::ObjectiveMode;
use super::policy::PolicyRule;
use super::problem::{GroupingModel, GroupingProblem};
use crate::cp::{BranchAndBoundSolver, CpSolver, SolverConfig, SolverStatus};
use crate::error::GroupingError;
use tracing::{debug, info, warn};

/// Result of a grouping run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupingResult {
    /// The groups found.
    pub assignment: GroupAssignment,

    /// Objective value reported by the solver.
    pub objective_value: i64,

    /// Whether the solver proved the assignment optimal. `false` when the
    /// time budget expired with an incumbent in hand, or when the search
    /// stopped at the first assignment.
    pub proven_optimal: bool,

    /// Wall time spent in the solver.
    pub solve_time_ms: i64,

    /// Search nodes explored.
    pub nodes: u64,

    /// Objective the assignment was optimized for.
    pub mode: ObjectiveMode,
}

/// Executes grouping problems against a [`CpSolver`].
pub struct GroupingRunner;

impl GroupingRunner {
    /// Solves `problem` with the built-in branch-and-bound solver and the
    /// default configuration.
    pub fn run(problem: &GroupingProblem) -> Result<GroupingResult, GroupingError> {
        Self::run_with(problem, &BranchAndBoundSolver::new(), &SolverConfig::default())
    }

    /// Solves `problem` with an explicit solver and configuration.
    ///
    /// Configuration errors are returned before the solver is invoked. When
    /// the model is infeasible and policy rules are enabled, lower ladder
    /// levels are re-solved to name the first rule that breaks feasibility.
    pub fn run_with<S: CpSolver + ?Sized>(
        problem: &GroupingProblem,
        solver: &S,
        config: &SolverConfig,
    ) -> Result<GroupingResult, GroupingError> {
        config
            .validate()
            .map_err(|reason| GroupingError::ModelInvalid { reason })?;
        let built = GroupingModel::build(problem)?;
        let dims = problem.dims();
        info!(
            students = dims.students,
            groups = dims.groups,
            mode = %problem.mode(),
            policy_level = problem.policy_level(),
            "solving grouping model"
        );

        let solution = solver.solve(&built.model, config);
        match solution.status {
            SolverStatus::Optimal | SolverStatus::Feasible => {}
            SolverStatus::Infeasible => {
                let conflicting_rule = Self::diagnose(problem, solver, config);
                warn!(?conflicting_rule, "grouping model is infeasible");
                return Err(GroupingError::Infeasible { conflicting_rule });
            }
            SolverStatus::Timeout => {
                warn!(
                    time_limit_ms = ?config.time_limit_ms,
                    "solver timed out without an assignment"
                );
                return Err(GroupingError::SolveTimeout {
                    time_limit_ms: config.time_limit_ms,
                });
            }
            SolverStatus::ModelInvalid => {
                let reason = built
                    .model
                    .validate()
                    .err()
                    .unwrap_or_else(|| "rejected by solver".to_string());
                return Err(GroupingError::ModelInvalid { reason });
            }
            status @ SolverStatus::Unknown => {
                return Err(GroupingError::SolverFailure { status });
            }
        }

        let assignment = GroupAssignment::from_solution(&built.vars, &solution)?;
        let objective_value = solution.objective_value.ok_or_else(|| {
            GroupingError::InconsistentSolution {
                reason: "solution carries no objective value".into(),
            }
        })?;
        let proven_optimal = solution.status == SolverStatus::Optimal;
        if !proven_optimal {
            warn!(
                objective_value,
                stop_after_first = config.stop_after_first,
                "search ended early, returning an assignment not proven optimal"
            );
        }
        info!(
            objective_value,
            proven_optimal,
            nodes = solution.nodes,
            solve_time_ms = solution.solve_time_ms,
            "grouping solved"
        );

        Ok(GroupingResult {
            assignment,
            objective_value,
            proven_optimal,
            solve_time_ms: solution.solve_time_ms,
            nodes: solution.nodes,
            mode: problem.mode(),
        })
    }

    /// First ladder rule whose addition makes the model infeasible, or
    /// `None` when the base model is already infeasible or a lower level
    /// could not be decided.
    fn diagnose<S: CpSolver + ?Sized>(
        problem: &GroupingProblem,
        solver: &S,
        config: &SolverConfig,
    ) -> Option<PolicyRule> {
        let top = problem.policy_level().min(PolicyRule::LADDER.len());
        if top == 0 {
            return None;
        }
        let first_only = config.clone().with_stop_after_first(true);
        for level in 0..top {
            let model = GroupingModel::assemble(problem, level);
            let status = solver.solve(&model.model, &first_only).status;
            debug!(level, ?status, "feasibility check");
            match status {
                SolverStatus::Optimal | SolverStatus::Feasible => {}
                SolverStatus::Infeasible if level > 0 => {
                    return Some(PolicyRule::LADDER[level - 1]);
                }
                _ => return None,
            }
        }
        Some(PolicyRule::LADDER[top - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{CpModel, CpSolution};
    use crate::grouping::{AttributeTable, ExperienceTable, PolicyConfig};
    use crate::preferences::{GeneratorConfig, PreferenceGenerator, PreferenceMatrix};
    use proptest::prelude::*;

    fn generated(students: usize, seed: u64) -> PreferenceMatrix {
        PreferenceGenerator::new(GeneratorConfig::new(students).with_seed(seed))
            .unwrap()
            .generate()
            .unwrap()
    }

    /// Every balanced assignment of `n` students to `k` groups.
    fn balanced_assignments(n: usize, k: usize) -> Vec<Vec<usize>> {
        let total = k.pow(n as u32);
        (0..total)
            .map(|mut code| {
                (0..n)
                    .map(|_| {
                        let g = code % k;
                        code /= k;
                        g
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|group_of| (0..k).all(|g| group_of.iter().filter(|&&x| x == g).count() == n / k))
            .collect()
    }

    fn evaluate(prefs: &PreferenceMatrix, group_of: &[usize], k: usize, mode: ObjectiveMode) -> i64 {
        let n = group_of.len();
        let mut group_totals = vec![0i64; k];
        let mut min_pair = i64::MAX;
        for i in 0..n {
            for j in 0..n {
                if group_of[i] != group_of[j] {
                    continue;
                }
                let p = i64::from(prefs.get(i, j));
                group_totals[group_of[i]] += p;
                if i != j {
                    min_pair = min_pair.min(p);
                }
            }
        }
        match mode {
            ObjectiveMode::Sum => group_totals.iter().sum(),
            ObjectiveMode::GroupFairness => group_totals.iter().copied().min().unwrap_or(0),
            ObjectiveMode::IndividualFairness => min_pair,
        }
    }

    fn brute_force(prefs: &PreferenceMatrix, k: usize, mode: ObjectiveMode) -> i64 {
        balanced_assignments(prefs.size(), k)
            .iter()
            .map(|group_of| evaluate(prefs, group_of, k, mode))
            .max()
            .unwrap_or(0)
    }

    fn assert_well_formed(result: &GroupingResult, n: usize, k: usize) {
        let a = &result.assignment;
        let mut seen = vec![false; n];
        for (g, members) in a.groups().iter().enumerate() {
            assert_eq!(members.len(), n / k, "group {g} size");
            for &i in members {
                assert!(!seen[i], "student {i} placed twice");
                seen[i] = true;
                assert_eq!(a.group_of(i), g);
            }
        }
        assert!(seen.iter().all(|&s| s));

        for i in 0..n {
            assert!(a.together(i, i));
            for j in 0..n {
                assert_eq!(a.together(i, j), a.together(j, i));
                for g in 0..k {
                    let both = a.group_of(i) == g && a.group_of(j) == g;
                    assert_eq!(a.pair_in_group(i, j, g), a.together(i, j) && both);
                    assert_eq!(a.pair_in_group(i, j, g), a.pair_in_group(j, i, g));
                }
            }
        }
    }

    #[test]
    fn test_matches_brute_force_all_modes() {
        for (k, seed) in [(2, 5), (3, 17)] {
            let prefs = generated(6, seed);
            for mode in ObjectiveMode::ALL {
                let problem = GroupingProblem::new(prefs.clone(), k).with_mode(mode);
                let result = GroupingRunner::run(&problem).unwrap();
                assert!(result.proven_optimal);
                assert_eq!(result.mode, mode);
                assert_eq!(
                    result.objective_value,
                    brute_force(&prefs, k, mode),
                    "mode {mode}, k = {k}"
                );
                assert_well_formed(&result, 6, k);
            }
        }
    }

    #[test]
    fn test_objective_agrees_with_assignment() {
        let prefs = generated(6, 23);
        let run = |mode| {
            GroupingRunner::run(&GroupingProblem::new(prefs.clone(), 3).with_mode(mode)).unwrap()
        };

        let sum = run(ObjectiveMode::Sum);
        assert_eq!(sum.objective_value, sum.assignment.total_score(&prefs));

        let group = run(ObjectiveMode::GroupFairness);
        assert_eq!(group.objective_value, group.assignment.min_group_score(&prefs));
        assert_eq!(group.assignment.fairness_bound(), Some(group.objective_value));
        assert!(group.assignment.total_score(&prefs) <= sum.objective_value);
        assert!(3 * group.objective_value <= sum.objective_value);

        let individual = run(ObjectiveMode::IndividualFairness);
        assert_eq!(
            Some(individual.objective_value),
            individual
                .assignment
                .min_realized_pair_score(&prefs)
                .map(i64::from)
        );
    }

    /// Nine students: student 0 strongly prefers student 4, everyone else is
    /// indifferent.
    fn scenario_matrix() -> PreferenceMatrix {
        let rows = (0..9)
            .map(|i| {
                (0..9)
                    .map(|j| match (i, j) {
                        _ if i == j => 1,
                        (0, 4) => 9,
                        (0, _) => 1,
                        _ => 2,
                    })
                    .collect()
            })
            .collect();
        PreferenceMatrix::from_rows(rows).unwrap()
    }

    fn scenario_policies() -> PolicyConfig {
        let labels = AttributeTable::personality_labels();
        let assigned = ["I", "I", "I", "E", "I", "E", "I", "E", "E"];
        let attributes = AttributeTable::from_labels(&labels, &assigned).unwrap();
        let experience = ExperienceTable::from_levels(&[6, 7, 4, 3, 3, 2, 8, 4, 6], 8).unwrap();
        PolicyConfig::new(attributes, experience).with_level(5)
    }

    #[test]
    fn test_scenario_with_full_ladder() {
        let policies = scenario_policies();
        let problem = GroupingProblem::new(scenario_matrix(), 3).with_policies(policies.clone());
        let result = GroupingRunner::run(&problem).unwrap();
        let a = &result.assignment;
        assert_well_formed(&result, 9, 3);

        // 0 and 4 together forces 8 as the only extravert that keeps the
        // group within the experience floor.
        assert_eq!(a.members(a.group_of(0)), &[0, 4, 8]);
        assert_ne!(a.group_of(0), a.group_of(7));
        // 9 self-pairs, 18 in the group of 0, 12 in each other group.
        assert_eq!(result.objective_value, 51);

        for members in a.groups() {
            assert!(members.iter().any(|&i| policies.attributes.has(i, 0)));
            assert!(members.iter().any(|&i| policies.experience.at_least(i, 5)));
            let below = members
                .iter()
                .filter(|&&i| !policies.experience.at_least(i, 4))
                .count();
            assert!(below <= 1);
        }
    }

    #[test]
    fn test_contradictory_pair_rules_name_the_conflict() {
        let policies = scenario_policies().with_together(0, 7).with_apart(0, 7);
        let problem = GroupingProblem::new(scenario_matrix(), 3).with_policies(policies);
        let err = GroupingRunner::run(&problem).unwrap_err();
        assert_eq!(
            err,
            GroupingError::Infeasible {
                conflicting_rule: Some(PolicyRule::KeepApart)
            }
        );
    }

    #[test]
    fn test_indivisible_rejected_before_solving() {
        struct Panicking;
        impl CpSolver for Panicking {
            fn solve(&self, _: &CpModel, _: &SolverConfig) -> CpSolution {
                panic!("solver must not be called");
            }
        }
        let problem = GroupingProblem::new(scenario_matrix(), 4);
        let err = GroupingRunner::run_with(&problem, &Panicking, &SolverConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            GroupingError::IndivisibleGroups {
                students: 9,
                groups: 4
            }
        );
    }

    #[test]
    fn test_timeout_maps_to_error() {
        let problem = GroupingProblem::new(generated(6, 3), 2);
        let config = SolverConfig::default().with_time_limit_ms(0);
        let err = GroupingRunner::run_with(&problem, &BranchAndBoundSolver::new(), &config)
            .unwrap_err();
        assert_eq!(
            err,
            GroupingError::SolveTimeout {
                time_limit_ms: Some(0)
            }
        );
    }

    #[test]
    fn test_feasible_status_returns_unproven_assignment() {
        /// Solves exactly, then reports the result as an interrupted search.
        struct Interrupted;
        impl CpSolver for Interrupted {
            fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
                let mut solution = BranchAndBoundSolver::new().solve(model, config);
                assert_eq!(solution.status, SolverStatus::Optimal);
                solution.status = SolverStatus::Feasible;
                solution.objective_value = solution.objective_value.map(|v| v - 1);
                solution
            }
        }
        let prefs = generated(6, 9);
        let problem = GroupingProblem::new(prefs.clone(), 2);
        let result =
            GroupingRunner::run_with(&problem, &Interrupted, &SolverConfig::default()).unwrap();

        assert!(!result.proven_optimal);
        assert_well_formed(&result, 6, 2);
        // The reported value is passed through untouched.
        assert_eq!(result.objective_value, result.assignment.total_score(&prefs) - 1);
    }

    #[test]
    fn test_stop_after_first_is_not_proven_optimal() {
        let prefs = generated(6, 9);
        let problem = GroupingProblem::new(prefs.clone(), 3);
        let config = SolverConfig::default().with_stop_after_first(true);
        let result =
            GroupingRunner::run_with(&problem, &BranchAndBoundSolver::new(), &config).unwrap();

        assert!(!result.proven_optimal);
        assert_well_formed(&result, 6, 3);
        assert_eq!(result.objective_value, result.assignment.total_score(&prefs));
        assert!(result.objective_value <= brute_force(&prefs, 3, ObjectiveMode::Sum));
    }

    #[test]
    fn test_timeout_without_limit_has_no_budget() {
        struct SelfTimed;
        impl CpSolver for SelfTimed {
            fn solve(&self, _: &CpModel, _: &SolverConfig) -> CpSolution {
                CpSolution::empty(SolverStatus::Timeout)
            }
        }
        let problem = GroupingProblem::new(generated(6, 3), 2);
        let config = SolverConfig::default().without_time_limit();
        let err = GroupingRunner::run_with(&problem, &SelfTimed, &config).unwrap_err();
        assert_eq!(
            err,
            GroupingError::SolveTimeout {
                time_limit_ms: None
            }
        );
        assert_eq!(err.to_string(), "no assignment found");
    }

    #[test]
    fn test_unknown_status_maps_to_failure() {
        struct Unknown;
        impl CpSolver for Unknown {
            fn solve(&self, _: &CpModel, _: &SolverConfig) -> CpSolution {
                CpSolution::empty(SolverStatus::Unknown)
            }
        }
        let problem = GroupingProblem::new(generated(6, 3), 2);
        let err = GroupingRunner::run_with(&problem, &Unknown, &SolverConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            GroupingError::SolverFailure {
                status: SolverStatus::Unknown
            }
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let problem = GroupingProblem::new(generated(6, 3), 2);
        let config = SolverConfig::default().with_num_workers(0);
        let err = GroupingRunner::run_with(&problem, &BranchAndBoundSolver::new(), &config)
            .unwrap_err();
        assert!(matches!(err, GroupingError::ModelInvalid { .. }));
    }

    #[test]
    fn test_bogus_solution_rejected() {
        struct AllZero;
        impl CpSolver for AllZero {
            fn solve(&self, model: &CpModel, _: &SolverConfig) -> CpSolution {
                CpSolution {
                    status: SolverStatus::Optimal,
                    objective_value: Some(0),
                    values: vec![0; model.var_count()],
                    solve_time_ms: 0,
                    nodes: 0,
                }
            }
        }
        let problem = GroupingProblem::new(generated(6, 3), 2);
        let err = GroupingRunner::run_with(&problem, &AllZero, &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, GroupingError::InconsistentSolution { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_sum_mode_partitions(seed in any::<u64>()) {
            let prefs = generated(6, seed);
            let result = GroupingRunner::run(&GroupingProblem::new(prefs.clone(), 3)).unwrap();
            assert_well_formed(&result, 6, 3);
            prop_assert_eq!(result.objective_value, result.assignment.total_score(&prefs));
            prop_assert_eq!(result.objective_value, brute_force(&prefs, 3, ObjectiveMode::Sum));
        }
    }
}
