//! Linear encodings of logical relations between boolean variables.

use super::model::{CpModel, LinearExpr};
use super::variables::VarId;

/// Constrains `result == operands[0] AND operands[1] AND ...`.
///
/// Emits the standard conjunction linearization:
///
/// - `result <= a` for every operand `a`
/// - `sum(operands) - result <= n - 1`
///
/// With two operands this is the familiar triple `c <= a`, `c <= b`,
/// `a + b - c <= 1`. All variables must be boolean. An empty operand list
/// forces `result == 1`.
pub fn add_and(model: &mut CpModel, result: VarId, operands: &[VarId]) {
    for &op in operands {
        model.add_le(result, op);
    }
    let sum: LinearExpr = operands.iter().map(|&op| (1, op)).collect();
    model.add_le(sum - result, operands.len() as i64 - 1);
}
