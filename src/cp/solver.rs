//! CP solver interface and a branch-and-bound implementation.

use super::model::{Comparison, CpModel, Objective};
use super::variables::{VarId, VarKind};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible (but not necessarily optimal) solution found.
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Solver exceeded its time limit without finding a solution.
    Timeout,
    /// No solution found for unknown reasons.
    Unknown,
}

/// Solution from a CP solver.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Objective function value (if the model has an objective and a
    /// solution was found).
    pub objective_value: Option<i64>,
    /// Variable assignment indexed by [`VarId`]. Empty when no solution was found.
    pub values: Vec<i64>,
    /// Solve time in milliseconds.
    pub solve_time_ms: i64,
    /// Number of search nodes explored.
    pub nodes: u64,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            values: Vec::new(),
            solve_time_ms: 0,
            nodes: 0,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
    }

    /// Value assigned to `var`, if a solution was found.
    pub fn try_value(&self, var: VarId) -> Option<i64> {
        self.values.get(var.index()).copied()
    }

    /// Value assigned to `var`.
    ///
    /// # Panics
    ///
    /// Panics if no solution was found or `var` belongs to another model.
    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.index()]
    }

    /// Boolean reading of the value assigned to `var`.
    pub fn bool_value(&self, var: VarId) -> bool {
        self.try_value(var).is_some_and(|v| v != 0)
    }
}

/// Solver configuration.
///
/// # Examples
///
/// ```
/// use u_groupform::cp::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_time_limit_ms(5_000)
///     .with_num_workers(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds. `None` = no limit.
    pub time_limit_ms: Option<u64>,
    /// Number of parallel workers (used with the `parallel` feature).
    pub num_workers: usize,
    /// Stop after finding the first feasible solution.
    pub stop_after_first: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: Some(60_000),
            num_workers: 1,
            stop_after_first: false,
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn without_time_limit(mut self) -> Self {
        self.time_limit_ms = None;
        self
    }

    pub fn with_num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1".into());
        }
        Ok(())
    }
}

/// Trait for CP solver implementations.
///
/// Implementors provide the actual constraint solving logic. This can wrap
/// external MIP/CP engines or provide custom search.
pub trait CpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

/// Depth-first branch-and-bound over bounded integer domains.
///
/// Every linear constraint is compiled to one or two `sum(a * x) <= b` rows.
/// Rows are propagated to a fixpoint after each branching decision
/// (bound tightening from minimum activity), and subtrees whose objective
/// bound cannot beat the incumbent are pruned.
///
/// Variables are branched in declaration order, so models should declare
/// their primary decision variables first. Each branch first tries the
/// value the objective prefers.
///
/// # Limitations
///
/// - Complete but exponential: intended for small assignment models
///   (tens of primary booleans), not for industrial instances
/// - Every domain must be finite
#[derive(Debug, Default, Clone, Copy)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BranchAndBoundSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let start = Instant::now();
        if let Err(reason) = model.validate().and_then(|_| config.validate()) {
            debug!(model = %model.name, %reason, "model rejected");
            return CpSolution::empty(SolverStatus::ModelInvalid);
        }

        let compiled = Compiled::from_model(model);
        let deadline = config
            .time_limit_ms
            .map(|ms| start + Duration::from_millis(ms));

        #[cfg(feature = "parallel")]
        let outcome = if config.num_workers > 1 {
            parallel::search(&compiled, deadline, config)
        } else {
            sequential_search(&compiled, deadline, config)
        };
        #[cfg(not(feature = "parallel"))]
        let outcome = sequential_search(&compiled, deadline, config);

        let status = match (&outcome.incumbent, outcome.timed_out || outcome.stopped) {
            (Some(_), false) => SolverStatus::Optimal,
            (Some(_), true) => SolverStatus::Feasible,
            (None, _) if outcome.timed_out => SolverStatus::Timeout,
            (None, _) => SolverStatus::Infeasible,
        };
        let solve_time_ms = start.elapsed().as_millis() as i64;
        debug!(
            model = %model.name,
            ?status,
            nodes = outcome.nodes,
            solve_time_ms,
            "search finished"
        );

        let (objective_value, values) = match outcome.incumbent {
            Some((value, values)) => {
                let objective_value = model.objective().map(|objective| match objective {
                    Objective::Maximize(_) => value,
                    Objective::Minimize(_) => -value,
                });
                (objective_value, values)
            }
            None => (None, Vec::new()),
        };

        CpSolution {
            status,
            objective_value,
            values,
            solve_time_ms,
            nodes: outcome.nodes,
        }
    }
}

/// `sum(coef * var) <= rhs` over dense variable indices.
#[derive(Debug)]
struct Row {
    terms: Vec<(usize, i64)>,
    rhs: i64,
}

/// Solver-side view of a model: `<=` rows, watch lists, and the objective
/// in maximization form.
#[derive(Debug)]
struct Compiled {
    rows: Vec<Row>,
    watches: Vec<Vec<usize>>,
    objective: Vec<(usize, i64)>,
    objective_constant: i64,
    prefer_high: Vec<bool>,
    lo: Vec<i64>,
    hi: Vec<i64>,
}

impl Compiled {
    fn from_model(model: &CpModel) -> Self {
        let n = model.var_count();
        let mut rows = Vec::with_capacity(model.constraint_count());
        for c in model.constraints() {
            let terms: Vec<(usize, i64)> = c.terms.iter().map(|&(v, a)| (v.index(), a)).collect();
            let negated = || terms.iter().map(|&(v, a)| (v, -a)).collect::<Vec<_>>();
            match c.cmp {
                Comparison::Le => rows.push(Row { terms: terms.clone(), rhs: c.rhs }),
                Comparison::Ge => rows.push(Row { terms: negated(), rhs: -c.rhs }),
                Comparison::Eq => {
                    rows.push(Row { terms: terms.clone(), rhs: c.rhs });
                    rows.push(Row { terms: negated(), rhs: -c.rhs });
                }
            }
        }

        let mut watches = vec![Vec::new(); n];
        for (r, row) in rows.iter().enumerate() {
            for &(v, _) in &row.terms {
                watches[v].push(r);
            }
        }

        let (objective, objective_constant) = match model.objective() {
            Some(Objective::Maximize(e)) => (
                e.terms().iter().map(|&(v, a)| (v.index(), a)).collect(),
                e.constant(),
            ),
            Some(Objective::Minimize(e)) => (
                e.terms().iter().map(|&(v, a)| (v.index(), -a)).collect(),
                -e.constant(),
            ),
            None => (Vec::new(), 0),
        };

        let mut coef = vec![0i64; n];
        for &(v, a) in &objective {
            coef[v] += a;
        }
        let prefer_high = model
            .variables()
            .iter()
            .zip(&coef)
            .map(|(var, &c)| c > 0 || (c == 0 && var.kind == VarKind::Bool))
            .collect();

        Self {
            rows,
            watches,
            objective,
            objective_constant,
            prefer_high,
            lo: model.variables().iter().map(|v| v.min).collect(),
            hi: model.variables().iter().map(|v| v.max).collect(),
        }
    }
}

/// Result of exploring one (sub)tree.
#[derive(Debug, Default)]
struct Outcome {
    incumbent: Option<(i64, Vec<i64>)>,
    nodes: u64,
    timed_out: bool,
    stopped: bool,
}

fn sequential_search(
    compiled: &Compiled,
    deadline: Option<Instant>,
    config: &SolverConfig,
) -> Outcome {
    let mut search = Search::new(
        compiled,
        compiled.lo.clone(),
        compiled.hi.clone(),
        deadline,
        config.stop_after_first,
        None,
    );
    search.enqueue_all();
    if search.propagate() {
        search.dfs();
    }
    search.into_outcome()
}

/// Mutable search state: current domains plus an undo trail.
struct Search<'a> {
    compiled: &'a Compiled,
    lo: Vec<i64>,
    hi: Vec<i64>,
    trail: Vec<(usize, i64, i64)>,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    incumbent: Option<(i64, Vec<i64>)>,
    shared_best: Option<&'a AtomicI64>,
    deadline: Option<Instant>,
    stop_after_first: bool,
    nodes: u64,
    timed_out: bool,
    stopped: bool,
}

impl<'a> Search<'a> {
    fn new(
        compiled: &'a Compiled,
        lo: Vec<i64>,
        hi: Vec<i64>,
        deadline: Option<Instant>,
        stop_after_first: bool,
        shared_best: Option<&'a AtomicI64>,
    ) -> Self {
        Self {
            compiled,
            lo,
            hi,
            trail: Vec::new(),
            queue: VecDeque::new(),
            queued: vec![false; compiled.rows.len()],
            incumbent: None,
            shared_best,
            deadline,
            stop_after_first,
            nodes: 0,
            timed_out: false,
            stopped: false,
        }
    }

    fn into_outcome(self) -> Outcome {
        Outcome {
            incumbent: self.incumbent,
            nodes: self.nodes,
            timed_out: self.timed_out,
            stopped: self.stopped,
        }
    }

    fn enqueue_all(&mut self) {
        for r in 0..self.compiled.rows.len() {
            if !self.queued[r] {
                self.queued[r] = true;
                self.queue.push_back(r);
            }
        }
    }

    /// Intersects the domain of `v` with `[lo, hi]`. Returns `false` on wipe-out.
    fn tighten(&mut self, v: usize, lo: i64, hi: i64) -> bool {
        let (old_lo, old_hi) = (self.lo[v], self.hi[v]);
        let new_lo = old_lo.max(lo);
        let new_hi = old_hi.min(hi);
        if new_lo > new_hi {
            return false;
        }
        if new_lo != old_lo || new_hi != old_hi {
            self.trail.push((v, old_lo, old_hi));
            self.lo[v] = new_lo;
            self.hi[v] = new_hi;
            let compiled = self.compiled;
            for &r in &compiled.watches[v] {
                if !self.queued[r] {
                    self.queued[r] = true;
                    self.queue.push_back(r);
                }
            }
        }
        true
    }

    fn backtrack(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some((v, lo, hi)) = self.trail.pop() {
                self.lo[v] = lo;
                self.hi[v] = hi;
            }
        }
    }

    /// Runs queued rows to a fixpoint. Returns `false` on conflict.
    fn propagate(&mut self) -> bool {
        while let Some(r) = self.queue.pop_front() {
            self.queued[r] = false;
            if !self.propagate_row(r) {
                for r in self.queue.drain(..) {
                    self.queued[r] = false;
                }
                return false;
            }
        }
        true
    }

    fn propagate_row(&mut self, r: usize) -> bool {
        let compiled = self.compiled;
        let row = &compiled.rows[r];
        let min_activity: i64 = row
            .terms
            .iter()
            .map(|&(v, a)| self.min_term(v, a))
            .sum();
        if min_activity > row.rhs {
            return false;
        }
        for &(v, a) in &row.terms {
            // Tightening v never changes its own minimum contribution.
            let residual = row.rhs - (min_activity - self.min_term(v, a));
            let feasible = if a > 0 {
                self.tighten(v, i64::MIN, floor_div(residual, a))
            } else {
                self.tighten(v, ceil_div(residual, a), i64::MAX)
            };
            if !feasible {
                return false;
            }
        }
        true
    }

    fn min_term(&self, v: usize, a: i64) -> i64 {
        if a > 0 {
            a * self.lo[v]
        } else {
            a * self.hi[v]
        }
    }

    fn objective_bound(&self) -> i64 {
        self.compiled.objective_constant
            + self
                .compiled
                .objective
                .iter()
                .map(|&(v, a)| if a > 0 { a * self.hi[v] } else { a * self.lo[v] })
                .sum::<i64>()
    }

    fn objective_value(&self) -> i64 {
        self.compiled.objective_constant
            + self
                .compiled
                .objective
                .iter()
                .map(|&(v, a)| a * self.lo[v])
                .sum::<i64>()
    }

    fn best_known(&self) -> Option<i64> {
        let own = self.incumbent.as_ref().map(|(value, _)| *value);
        let shared = self
            .shared_best
            .map(|s| s.load(Ordering::Relaxed))
            .filter(|&v| v != i64::MIN);
        match (own, shared) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    fn next_unfixed(&self) -> Option<usize> {
        (0..self.lo.len()).find(|&v| self.lo[v] < self.hi[v])
    }

    /// The two child domains of `v`, preferred value first.
    fn children(&self, v: usize) -> [(i64, i64); 2] {
        let (lo, hi) = (self.lo[v], self.hi[v]);
        if self.compiled.prefer_high[v] {
            [(hi, hi), (lo, hi - 1)]
        } else {
            [(lo, lo), (lo + 1, hi)]
        }
    }

    fn should_stop(&self) -> bool {
        self.timed_out || self.stopped
    }

    fn dfs(&mut self) {
        self.nodes += 1;
        if self.nodes % 1024 == 1 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.timed_out = true;
                }
            }
        }
        if self.should_stop() {
            return;
        }
        if let Some(best) = self.best_known() {
            if self.objective_bound() <= best {
                return;
            }
        }

        let Some(v) = self.next_unfixed() else {
            self.record();
            return;
        };
        for (lo, hi) in self.children(v) {
            let mark = self.trail.len();
            if self.tighten(v, lo, hi) && self.propagate() {
                self.dfs();
            }
            self.backtrack(mark);
            if self.should_stop() {
                return;
            }
        }
    }

    fn record(&mut self) {
        let value = self.objective_value();
        if self.best_known().is_some_and(|best| value <= best) {
            return;
        }
        trace!(objective = value, nodes = self.nodes, "new incumbent");
        self.incumbent = Some((value, self.lo.clone()));
        if let Some(shared) = self.shared_best {
            shared.fetch_max(value, Ordering::Relaxed);
        }
        if self.stop_after_first {
            self.stopped = true;
        }
    }
}

fn floor_div(n: i64, d: i64) -> i64 {
    let q = n / d;
    if n % d != 0 && ((n < 0) != (d < 0)) {
        q - 1
    } else {
        q
    }
}

fn ceil_div(n: i64, d: i64) -> i64 {
    let q = n / d;
    if n % d != 0 && ((n < 0) == (d < 0)) {
        q + 1
    } else {
        q
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    use super::{Compiled, Outcome, Search, SolverConfig};
    use rayon::prelude::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicI64;
    use std::time::Instant;

    type Domains = (Vec<i64>, Vec<i64>);

    /// Splits the root into open subproblems and searches them on the rayon
    /// pool, sharing the best objective value for pruning.
    pub(super) fn search(
        compiled: &Compiled,
        deadline: Option<Instant>,
        config: &SolverConfig,
    ) -> Outcome {
        let mut root = Search::new(
            compiled,
            compiled.lo.clone(),
            compiled.hi.clone(),
            deadline,
            config.stop_after_first,
            None,
        );
        root.enqueue_all();
        if !root.propagate() {
            return Outcome::default();
        }
        let frontier = split(root, config.num_workers * 4);

        let shared = AtomicI64::new(i64::MIN);
        let parts: Vec<Outcome> = frontier
            .into_par_iter()
            .map(|(lo, hi)| {
                let mut search = Search::new(
                    compiled,
                    lo,
                    hi,
                    deadline,
                    config.stop_after_first,
                    Some(&shared),
                );
                search.dfs();
                search.into_outcome()
            })
            .collect();

        let mut merged = Outcome::default();
        for part in parts {
            merged.nodes += part.nodes;
            merged.timed_out |= part.timed_out;
            merged.stopped |= part.stopped;
            if let Some((value, values)) = part.incumbent {
                if merged.incumbent.as_ref().is_none_or(|(best, _)| value > *best) {
                    merged.incumbent = Some((value, values));
                }
            }
        }
        merged
    }

    fn split(mut scout: Search<'_>, target: usize) -> Vec<Domains> {
        let mut frontier: VecDeque<Domains> = VecDeque::from([(scout.lo.clone(), scout.hi.clone())]);
        let mut leaves = Vec::new();
        while frontier.len() + leaves.len() < target {
            let Some((lo, hi)) = frontier.pop_front() else {
                break;
            };
            scout.lo = lo;
            scout.hi = hi;
            scout.trail.clear();
            let Some(v) = scout.next_unfixed() else {
                leaves.push((scout.lo.clone(), scout.hi.clone()));
                continue;
            };
            for (clo, chi) in scout.children(v) {
                let mark = scout.trail.len();
                if scout.tighten(v, clo, chi) && scout.propagate() {
                    frontier.push_back((scout.lo.clone(), scout.hi.clone()));
                }
                scout.backtrack(mark);
            }
        }
        frontier.extend(leaves);
        frontier.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::LinearExpr;

    fn solve(model: &CpModel) -> CpSolution {
        BranchAndBoundSolver::new().solve(model, &SolverConfig::default())
    }

    #[test]
    fn test_knapsack_optimal() {
        let mut model = CpModel::new("knapsack");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        let c = model.new_bool_var("c");
        model.add_le(LinearExpr::from(a) * 2 + LinearExpr::from(b) * 3 + c, 4);
        model.maximize(LinearExpr::from(a) * 5 + LinearExpr::from(b) * 4 + LinearExpr::from(c) * 3);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, Some(8));
        assert!(solution.bool_value(a));
        assert!(!solution.bool_value(b));
        assert!(solution.bool_value(c));
    }

    #[test]
    fn test_integer_bound_tightening() {
        let mut model = CpModel::new("int");
        let x = model.new_int_var("x", 0, 100);
        model.add_le(LinearExpr::from(x) * 3, 10);
        model.maximize(x);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.value(x), 3);
    }

    #[test]
    fn test_minimize() {
        let mut model = CpModel::new("min");
        let x = model.new_int_var("x", 0, 5);
        let y = model.new_int_var("y", 0, 5);
        model.add_ge(LinearExpr::from(x) + LinearExpr::from(y) * 2, 5);
        model.minimize(LinearExpr::from(x) + y);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, Some(3));
        assert!(solution.value(x) + 2 * solution.value(y) >= 5);
    }

    #[test]
    fn test_solution_satisfies_every_constraint() {
        let mut model = CpModel::new("cover");
        let vars: Vec<VarId> = (0..6).map(|i| model.new_bool_var(format!("v{i}"))).collect();
        for w in vars.windows(2) {
            model.add_ge(LinearExpr::from(w[0]) + w[1], 1);
        }
        model.minimize(vars.iter().map(|&v| (1, v)).collect::<LinearExpr>());

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, Some(3));
        assert!(model
            .constraints()
            .iter()
            .all(|c| c.is_satisfied(&solution.values)));
    }

    #[test]
    fn test_infeasible() {
        let mut model = CpModel::new("infeasible");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        model.add_ge(LinearExpr::from(a) + b, 3);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Infeasible);
        assert!(!solution.is_solution_found());
        assert!(solution.try_value(a).is_none());
    }

    #[test]
    fn test_constant_only_conflict() {
        let mut model = CpModel::new("constant");
        model.new_bool_var("a");
        model.add_le(LinearExpr::from(1), 0);

        assert_eq!(solve(&model).status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_invalid_model() {
        let mut model = CpModel::new("invalid");
        model.new_int_var("x", 3, 1);

        assert_eq!(solve(&model).status, SolverStatus::ModelInvalid);
    }

    #[test]
    fn test_zero_time_limit_times_out() {
        let mut model = CpModel::new("timeout");
        let a = model.new_bool_var("a");
        model.maximize(a);

        let config = SolverConfig::default().with_time_limit_ms(0);
        let solution = BranchAndBoundSolver::new().solve(&model, &config);
        assert_eq!(solution.status, SolverStatus::Timeout);
    }

    #[test]
    fn test_stop_after_first_is_feasible() {
        let mut model = CpModel::new("first");
        let vars: Vec<VarId> = (0..4).map(|i| model.new_bool_var(format!("v{i}"))).collect();
        model.add_le(vars.iter().map(|&v| (1, v)).collect::<LinearExpr>(), 2);
        model.maximize(vars.iter().map(|&v| (1, v)).collect::<LinearExpr>());

        let config = SolverConfig::default().with_stop_after_first(true);
        let solution = BranchAndBoundSolver::new().solve(&model, &config);
        assert_eq!(solution.status, SolverStatus::Feasible);
        assert!(solution.is_solution_found());
    }

    #[test]
    fn test_no_objective_feasibility() {
        let mut model = CpModel::new("feasibility");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        model.add_eq(LinearExpr::from(a) + b, 1);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, None);
        assert_eq!(solution.value(a) + solution.value(b), 1);
    }

    #[cfg(feature = "parallel")]
    mod parallel_search {
        use super::*;
        use crate::grouping::{GroupingModel, GroupingProblem, ObjectiveMode};
        use crate::preferences::{GeneratorConfig, PreferenceGenerator};

        fn workers(n: usize) -> SolverConfig {
            SolverConfig::default().with_num_workers(n)
        }

        #[test]
        fn test_parallel_matches_sequential_on_grouping() {
            for seed in [1, 2] {
                let prefs = PreferenceGenerator::new(GeneratorConfig::new(6).with_seed(seed))
                    .unwrap()
                    .generate()
                    .unwrap();
                for mode in ObjectiveMode::ALL {
                    let problem = GroupingProblem::new(prefs.clone(), 3).with_mode(mode);
                    let built = GroupingModel::build(&problem).unwrap();
                    let solver = BranchAndBoundSolver::new();

                    let sequential = solver.solve(&built.model, &workers(1));
                    let parallel = solver.solve(&built.model, &workers(4));
                    assert_eq!(parallel.status, SolverStatus::Optimal, "mode {mode}");
                    assert_eq!(parallel.objective_value, sequential.objective_value);
                    assert!(built
                        .model
                        .constraints()
                        .iter()
                        .all(|c| c.is_satisfied(&parallel.values)));
                }
            }
        }

        #[test]
        fn test_parallel_contradiction_is_infeasible() {
            let mut model = CpModel::new("contradiction");
            let a = model.new_bool_var("a");
            model.new_bool_var("b");
            model.add_eq(a, 1);
            model.add_eq(a, 0);
            let solution = BranchAndBoundSolver::new().solve(&model, &workers(4));
            assert_eq!(solution.status, SolverStatus::Infeasible);
        }

        #[test]
        fn test_parallel_infeasible_after_branching() {
            // Pairwise exclusive, yet two must hold: only branching refutes it.
            let mut model = CpModel::new("pigeonhole");
            let v: Vec<VarId> = (0..3).map(|i| model.new_bool_var(format!("v{i}"))).collect();
            for i in 0..3 {
                for j in (i + 1)..3 {
                    model.add_le(LinearExpr::from(v[i]) + v[j], 1);
                }
            }
            model.add_ge(v.iter().map(|&x| (1, x)).collect::<LinearExpr>(), 2);
            model.maximize(v[0]);

            let solution = BranchAndBoundSolver::new().solve(&model, &workers(4));
            assert_eq!(solution.status, SolverStatus::Infeasible);
            assert!(!solution.is_solution_found());
        }

        #[test]
        fn test_parallel_stop_after_first_is_feasible() {
            let mut model = CpModel::new("first");
            let vars: Vec<VarId> = (0..6).map(|i| model.new_bool_var(format!("v{i}"))).collect();
            model.add_le(vars.iter().map(|&v| (1, v)).collect::<LinearExpr>(), 3);
            model.maximize(vars.iter().map(|&v| (1, v)).collect::<LinearExpr>());

            let config = workers(4).with_stop_after_first(true);
            let solution = BranchAndBoundSolver::new().solve(&model, &config);
            assert_eq!(solution.status, SolverStatus::Feasible);
            assert!(model
                .constraints()
                .iter()
                .all(|c| c.is_satisfied(&solution.values)));
        }
    }

    #[test]
    fn test_division_helpers() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(7, -2), -3);
        assert_eq!(floor_div(6, 3), 2);
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit_ms, Some(60_000));
        assert_eq!(config.num_workers, 1);
        assert!(!config.stop_after_first);
        assert!(SolverConfig::default().with_num_workers(0).validate().is_err());
    }
}
