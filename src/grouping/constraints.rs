//! Structural constraints tying the variable families together.

use super::entities::GroupingVars;
use crate::cp::{add_and, CpModel, LinearExpr};

/// Adds every structural constraint of the grouping model.
///
/// Group sizes are stated as `K * sum == N`, which equals `sum == N / K`
/// whenever `K` divides `N` and is infeasible otherwise.
pub fn add_structural_constraints(model: &mut CpModel, vars: &GroupingVars) {
    link_pair_in_group(model, vars);
    add_partition(model, vars);
    add_group_size(model, vars);
    add_reflexivity(model, vars);
    add_self_pair_count(model, vars);
    add_symmetry(model, vars);
}

/// `y_ijk = x_ij AND x_ik` and `y_ijk = x_ik AND x_jk`.
pub fn link_pair_in_group(model: &mut CpModel, vars: &GroupingVars) {
    for i in vars.students() {
        for j in vars.students() {
            let together = vars.pair_together(i, j);
            for k in vars.groups() {
                let y = vars.pair_in_group(i, j, k);
                let (member_i, member_j) = (vars.membership(i, k), vars.membership(j, k));
                add_and(model, y, &[together, member_i]);
                add_and(model, y, &[member_i, member_j]);
            }
        }
    }
}

/// Every student is in exactly one group.
pub fn add_partition(model: &mut CpModel, vars: &GroupingVars) {
    for i in vars.students() {
        let groups: LinearExpr = vars.groups().map(|k| (1, vars.membership(i, k))).collect();
        model.add_eq(groups, 1);
    }
}

/// Every group holds exactly `N / K` students (both bounds).
pub fn add_group_size(model: &mut CpModel, vars: &GroupingVars) {
    let dims = vars.dims();
    let (n, k) = (dims.students as i64, dims.groups as i64);
    for g in vars.groups() {
        let scaled: LinearExpr = vars.students().map(|i| (k, vars.membership(i, g))).collect();
        model.add_ge(scaled.clone(), n);
        model.add_le(scaled, n);
    }
}

/// Every student is together with themself.
pub fn add_reflexivity(model: &mut CpModel, vars: &GroupingVars) {
    for i in vars.students() {
        model.add_eq(vars.pair_together(i, i), 1);
    }
}

/// Per group, the self-pairs `y_iik` count exactly the group size.
pub fn add_self_pair_count(model: &mut CpModel, vars: &GroupingVars) {
    let dims = vars.dims();
    let (n, k) = (dims.students as i64, dims.groups as i64);
    for g in vars.groups() {
        let scaled: LinearExpr = vars
            .students()
            .map(|i| (k, vars.pair_in_group(i, i, g)))
            .collect();
        model.add_eq(scaled, n);
    }
}

/// `x_ij == x_ji` and `y_ijk == y_jik` for every pair and group.
pub fn add_symmetry(model: &mut CpModel, vars: &GroupingVars) {
    for i in vars.students() {
        for j in (i + 1)..vars.dims().students {
            model.add_eq(vars.pair_together(i, j), vars.pair_together(j, i));
            for k in vars.groups() {
                model.add_eq(vars.pair_in_group(i, j, k), vars.pair_in_group(j, i, k));
            }
        }
    }
}
