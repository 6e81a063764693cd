//! Objective strategies.

use super::entities::GroupingVars;
use crate::cp::{CpModel, LinearExpr};
use crate::preferences::PreferenceMatrix;
use std::fmt;

/// Optimization target of a grouping model.
///
/// Exactly one mode is installed per model. The structural constraints are
/// identical for every mode; the fairness modes add a bound variable and
/// one constraint per group or per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectiveMode {
    /// Maximize `sum(P[i][j] * x_ij)` over all ordered pairs.
    #[default]
    Sum,
    /// Maximize the lowest group total `sum(P[i][j] * y_ijk)`.
    GroupFairness,
    /// Maximize the lowest score among realized pairings (`i != j`, `x_ij = 1`).
    IndividualFairness,
}

impl ObjectiveMode {
    /// All modes.
    pub const ALL: [ObjectiveMode; 3] = [
        ObjectiveMode::Sum,
        ObjectiveMode::GroupFairness,
        ObjectiveMode::IndividualFairness,
    ];

    /// Whether the mode maximizes a fairness bound variable.
    pub fn uses_fairness_bound(self) -> bool {
        !matches!(self, ObjectiveMode::Sum)
    }

    /// Installs the objective (and any bound constraints) on `model`.
    pub(crate) fn install(
        self,
        model: &mut CpModel,
        vars: &mut GroupingVars,
        preferences: &PreferenceMatrix,
    ) {
        let score = |i: usize, j: usize| i64::from(preferences.get(i, j));
        match self {
            ObjectiveMode::Sum => {
                let total: LinearExpr = vars
                    .students()
                    .flat_map(|i| vars.students().map(move |j| (i, j)))
                    .map(|(i, j)| (score(i, j), vars.pair_together(i, j)))
                    .collect();
                model.maximize(total);
            }
            ObjectiveMode::GroupFairness => {
                let bound = vars.declare_fairness_bound(model, preferences.total() as i64);
                model.maximize(bound);
                for k in vars.groups() {
                    let group_total: LinearExpr = vars
                        .students()
                        .flat_map(|i| vars.students().map(move |j| (i, j)))
                        .map(|(i, j)| (score(i, j), vars.pair_in_group(i, j, k)))
                        .collect();
                    model.add_ge(group_total, bound);
                }
            }
            ObjectiveMode::IndividualFairness => {
                // P*x + M*(1 - x) >= bound: binding only when the pair is realized.
                let big_m = i64::from(preferences.max_score());
                let bound = vars.declare_fairness_bound(model, big_m);
                model.maximize(bound);
                for i in vars.students() {
                    for j in vars.students().filter(|&j| j != i) {
                        let x = vars.pair_together(i, j);
                        let slackened = LinearExpr::from(x) * (score(i, j) - big_m) + big_m;
                        model.add_ge(slackened, bound);
                    }
                }
            }
        }
    }
}

impl fmt::Display for ObjectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObjectiveMode::Sum => "sum",
            ObjectiveMode::GroupFairness => "group-fairness",
            ObjectiveMode::IndividualFairness => "individual-fairness",
        };
        f.write_str(label)
    }
}
