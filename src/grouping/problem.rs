//! Problem definition and model assembly.

use super::constraints::add_structural_constraints;
use super::entities::{GroupingDims, GroupingVars};
use super::objective::ObjectiveMode;
use super::policy::{apply_policies, PolicyConfig};
use crate::cp::CpModel;
use crate::error::GroupingError;
use crate::preferences::PreferenceMatrix;
use tracing::debug;

/// A group formation instance: who likes whom, how many groups, what to
/// optimize, and which policy rules to enforce.
///
/// # Examples
///
/// ```
/// use u_groupform::grouping::{GroupingProblem, ObjectiveMode};
/// use u_groupform::preferences::{GeneratorConfig, PreferenceGenerator};
///
/// let generator = PreferenceGenerator::new(GeneratorConfig::new(6).with_seed(7)).unwrap();
/// let problem = GroupingProblem::new(generator.generate().unwrap(), 3)
///     .with_mode(ObjectiveMode::GroupFairness);
/// assert!(problem.validate().is_ok());
/// assert_eq!(problem.dims().group_size(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct GroupingProblem {
    preferences: PreferenceMatrix,
    groups: usize,
    mode: ObjectiveMode,
    policies: Option<PolicyConfig>,
}

impl GroupingProblem {
    pub fn new(preferences: PreferenceMatrix, groups: usize) -> Self {
        Self {
            preferences,
            groups,
            mode: ObjectiveMode::default(),
            policies: None,
        }
    }

    pub fn with_mode(mut self, mode: ObjectiveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_policies(mut self, policies: PolicyConfig) -> Self {
        self.policies = Some(policies);
        self
    }

    pub fn preferences(&self) -> &PreferenceMatrix {
        &self.preferences
    }

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn mode(&self) -> ObjectiveMode {
        self.mode
    }

    pub fn policies(&self) -> Option<&PolicyConfig> {
        self.policies.as_ref()
    }

    pub fn dims(&self) -> GroupingDims {
        GroupingDims::new(self.preferences.size(), self.groups)
    }

    /// Enabled ladder level (`0` without policies).
    pub fn policy_level(&self) -> usize {
        self.policies.as_ref().map_or(0, |p| p.level)
    }

    /// Rejects instances that cannot be modeled, before any solve attempt.
    pub fn validate(&self) -> Result<(), GroupingError> {
        let dims = self.dims();
        if dims.groups == 0 || dims.groups > dims.students {
            return Err(GroupingError::InvalidGroupCount {
                students: dims.students,
                groups: dims.groups,
            });
        }
        if !dims.is_divisible() {
            return Err(GroupingError::IndivisibleGroups {
                students: dims.students,
                groups: dims.groups,
            });
        }
        if let Some(policies) = &self.policies {
            policies.validate(dims.students)?;
        }
        Ok(())
    }
}

/// A fully built model plus the handles needed to read a solution back.
#[derive(Debug, Clone)]
pub struct GroupingModel {
    /// The underlying CP model.
    pub model: CpModel,
    /// Variable handles.
    pub vars: GroupingVars,
}

impl GroupingModel {
    /// Validates `problem` and builds its model with the configured policy
    /// level.
    pub fn build(problem: &GroupingProblem) -> Result<Self, GroupingError> {
        problem.validate()?;
        Ok(Self::assemble(problem, problem.policy_level()))
    }

    /// Builds the model with policy rules `1..=policy_level` only.
    /// `problem` must already be validated.
    pub(crate) fn assemble(problem: &GroupingProblem, policy_level: usize) -> Self {
        let dims = problem.dims();
        let mut model = CpModel::new(format!(
            "grouping-{}x{}-{}",
            dims.students, dims.groups, problem.mode
        ));
        let mut vars = GroupingVars::declare(&mut model, dims);
        add_structural_constraints(&mut model, &vars);
        if let Some(policies) = &problem.policies {
            apply_policies(&mut model, &vars, policies, policy_level);
        }
        problem.mode.install(&mut model, &mut vars, &problem.preferences);

        debug!(
            model = %model.name,
            variables = model.var_count(),
            constraints = model.constraint_count(),
            policy_level,
            "grouping model built"
        );
        Self { model, vars }
    }
}
