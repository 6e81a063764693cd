//! Optional policy rules layered on top of the base model.
//!
//! Rules form a ladder: enabling level `n` applies rules `1..=n` in order.
//! Each rule only adds constraints, so any prefix of the ladder composes
//! with the structural model; contradictory settings surface as an
//! infeasible model, never as a silently relaxed one.

use super::attributes::{AttributeTable, ExperienceTable};
use super::entities::GroupingVars;
use crate::cp::{CpModel, LinearExpr};
use crate::error::GroupingError;
use std::fmt;
use tracing::debug;

/// One rung of the policy ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolicyRule {
    /// Every group has a member with the required attribute.
    RequireAttribute,
    /// Every group has a member at or above the lead level.
    RequireLead,
    /// Every group has at most one member below the floor level.
    LimitBelowFloor,
    /// The designated pair shares a group.
    KeepTogether,
    /// The designated pair is split.
    KeepApart,
}

impl PolicyRule {
    /// Rules in application order.
    pub const LADDER: [PolicyRule; 5] = [
        PolicyRule::RequireAttribute,
        PolicyRule::RequireLead,
        PolicyRule::LimitBelowFloor,
        PolicyRule::KeepTogether,
        PolicyRule::KeepApart,
    ];

    /// One-based position on the ladder.
    pub fn level(self) -> usize {
        match self {
            PolicyRule::RequireAttribute => 1,
            PolicyRule::RequireLead => 2,
            PolicyRule::LimitBelowFloor => 3,
            PolicyRule::KeepTogether => 4,
            PolicyRule::KeepApart => 5,
        }
    }

    /// Rules active at `level`.
    pub fn up_to(level: usize) -> &'static [PolicyRule] {
        &Self::LADDER[..level.min(Self::LADDER.len())]
    }

    /// Adds this rule's constraints.
    pub(crate) fn apply(self, model: &mut CpModel, vars: &GroupingVars, config: &PolicyConfig) {
        match self {
            PolicyRule::RequireAttribute => {
                let column = config.required_attribute;
                for k in vars.groups() {
                    let carriers = members_where(vars, k, |i| config.attributes.has(i, column));
                    model.add_ge(carriers, 1);
                }
            }
            PolicyRule::RequireLead => {
                for k in vars.groups() {
                    let leads =
                        members_where(vars, k, |i| config.experience.at_least(i, config.lead_level));
                    model.add_ge(leads, 1);
                }
            }
            PolicyRule::LimitBelowFloor => {
                let at_floor = vars.dims().group_size() as i64 - 1;
                for k in vars.groups() {
                    let proficient = members_where(vars, k, |i| {
                        config.experience.at_least(i, config.floor_level)
                    });
                    model.add_ge(proficient, at_floor);
                }
            }
            PolicyRule::KeepTogether => {
                let (a, b) = config.together;
                model.add_eq(vars.pair_together(a, b), 1);
            }
            PolicyRule::KeepApart => {
                let (a, b) = config.apart;
                model.add_eq(vars.pair_together(a, b), 0);
            }
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PolicyRule::RequireAttribute => "attribute carrier in every group",
            PolicyRule::RequireLead => "experienced lead in every group",
            PolicyRule::LimitBelowFloor => "at most one member below the experience floor",
            PolicyRule::KeepTogether => "designated pair together",
            PolicyRule::KeepApart => "designated pair apart",
        };
        f.write_str(label)
    }
}

/// `sum(x_ik)` over the students of group `k` selected by `keep`.
fn members_where(vars: &GroupingVars, k: usize, keep: impl Fn(usize) -> bool) -> LinearExpr {
    vars.students()
        .filter(|&i| keep(i))
        .map(|i| (1, vars.membership(i, k)))
        .collect()
}

/// Settings of the policy ladder.
///
/// Students are zero-indexed. The defaults require an extravert (`E`,
/// column 0) per group, a lead of level 5 or higher, at most one member
/// below level 4, keep students 0 and 4 together, and students 0 and 7
/// apart.
///
/// # Examples
///
/// ```
/// use u_groupform::grouping::{AttributeTable, ExperienceTable, PolicyConfig, PolicyRule};
///
/// let attributes = AttributeTable::from_labels(&["E", "I"], &["E", "I", "E", "I"]).unwrap();
/// let experience = ExperienceTable::from_levels(&[5, 2, 4, 6], 8).unwrap();
/// let config = PolicyConfig::new(attributes, experience)
///     .with_level(4)
///     .with_together(1, 3);
/// assert!(config.validate(4).is_ok());
/// assert_eq!(config.active_rules().last(), Some(&PolicyRule::KeepTogether));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyConfig {
    /// Ladder level `0..=5`; `0` disables every rule.
    pub level: usize,
    /// Categorical attribute table.
    pub attributes: AttributeTable,
    /// Experience table.
    pub experience: ExperienceTable,
    /// Attribute column required in every group.
    pub required_attribute: usize,
    /// Experience level a group lead needs.
    pub lead_level: usize,
    /// Experience level all but one member of each group must reach.
    pub floor_level: usize,
    /// Pair kept together.
    pub together: (usize, usize),
    /// Pair kept apart.
    pub apart: (usize, usize),
}

impl PolicyConfig {
    pub fn new(attributes: AttributeTable, experience: ExperienceTable) -> Self {
        Self {
            level: 0,
            attributes,
            experience,
            required_attribute: 0,
            lead_level: 5,
            floor_level: 4,
            together: (0, 4),
            apart: (0, 7),
        }
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    pub fn with_required_attribute(mut self, column: usize) -> Self {
        self.required_attribute = column;
        self
    }

    pub fn with_lead_level(mut self, level: usize) -> Self {
        self.lead_level = level;
        self
    }

    pub fn with_floor_level(mut self, level: usize) -> Self {
        self.floor_level = level;
        self
    }

    pub fn with_together(mut self, a: usize, b: usize) -> Self {
        self.together = (a, b);
        self
    }

    pub fn with_apart(mut self, a: usize, b: usize) -> Self {
        self.apart = (a, b);
        self
    }

    /// Rules enabled by [`level`](Self::level).
    pub fn active_rules(&self) -> &'static [PolicyRule] {
        PolicyRule::up_to(self.level)
    }

    /// Validates the settings used by the active rules against a class of
    /// `students`.
    pub fn validate(&self, students: usize) -> Result<(), GroupingError> {
        if self.level > PolicyRule::LADDER.len() {
            return Err(invalid(format!(
                "level {} exceeds the {} available rules",
                self.level,
                PolicyRule::LADDER.len()
            )));
        }
        for rule in self.active_rules() {
            match rule {
                PolicyRule::RequireAttribute => {
                    check_rows("attribute", self.attributes.students(), students)?;
                    if self.required_attribute >= self.attributes.width() {
                        return Err(invalid(format!(
                            "attribute column {} outside table width {}",
                            self.required_attribute,
                            self.attributes.width()
                        )));
                    }
                }
                PolicyRule::RequireLead | PolicyRule::LimitBelowFloor => {
                    check_rows("experience", self.experience.students(), students)?;
                    let level = if *rule == PolicyRule::RequireLead {
                        self.lead_level
                    } else {
                        self.floor_level
                    };
                    if level == 0 || level > self.experience.width() {
                        return Err(invalid(format!(
                            "experience level {level} outside 1..={}",
                            self.experience.width()
                        )));
                    }
                }
                PolicyRule::KeepTogether => check_pair("together", self.together, students)?,
                PolicyRule::KeepApart => check_pair("apart", self.apart, students)?,
            }
        }
        Ok(())
    }
}

fn check_rows(table: &str, rows: usize, students: usize) -> Result<(), GroupingError> {
    if rows != students {
        return Err(invalid(format!(
            "{table} table has {rows} rows for {students} students"
        )));
    }
    Ok(())
}

fn check_pair(name: &str, (a, b): (usize, usize), students: usize) -> Result<(), GroupingError> {
    if a >= students || b >= students {
        return Err(invalid(format!(
            "{name} pair ({a}, {b}) outside 0..{students}"
        )));
    }
    if a == b {
        return Err(invalid(format!("{name} pair repeats student {a}")));
    }
    Ok(())
}

fn invalid(reason: String) -> GroupingError {
    GroupingError::InvalidPolicy { reason }
}

/// Applies the rules enabled at `level` in ladder order.
pub(crate) fn apply_policies(
    model: &mut CpModel,
    vars: &GroupingVars,
    config: &PolicyConfig,
    level: usize,
) {
    for &rule in PolicyRule::up_to(level) {
        let before = model.constraint_count();
        rule.apply(model, vars, config);
        debug!(
            level = rule.level(),
            %rule,
            constraints = model.constraint_count() - before,
            "policy rule applied"
        );
    }
}
