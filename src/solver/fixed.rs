//! Replay backend.

use std::collections::HashMap;

use super::{AssignmentSolver, SolverOutput, SolverStatus};
use crate::model::{AssignmentModel, BinarySolution, VarKey};

/// Returns a precomputed plan without looking at the constraints.
///
/// Useful for replaying a known assignment and for exercising the
/// resolver against arbitrary, even inconsistent, solver answers.
#[derive(Debug, Clone)]
pub struct FixedSolver {
    status: SolverStatus,
    values: HashMap<VarKey, f64>,
}

impl FixedSolver {
    /// Replays a 0/1 plan with `Optimal` status.
    pub fn new(plan: &BinarySolution) -> Self {
        Self {
            status: SolverStatus::Optimal,
            values: plan
                .ones()
                .into_iter()
                .map(|key| (key, 1.0))
                .collect(),
        }
    }

    /// Replays raw values, noise included.
    pub fn from_values(values: HashMap<VarKey, f64>) -> Self {
        Self {
            status: SolverStatus::Optimal,
            values,
        }
    }

    /// Always answers `Infeasible`.
    pub fn infeasible() -> Self {
        Self {
            status: SolverStatus::Infeasible,
            values: HashMap::new(),
        }
    }

    /// Overrides the reported status.
    pub fn with_status(mut self, status: SolverStatus) -> Self {
        self.status = status;
        self
    }
}

impl AssignmentSolver for FixedSolver {
    fn name(&self) -> &str {
        "fixed"
    }

    fn solve(&self, model: &AssignmentModel) -> SolverOutput {
        if !self.status.is_solved() {
            return SolverOutput {
                status: self.status.clone(),
                values: HashMap::new(),
            };
        }
        // Fill every model variable so the answer looks like a real backend's
        let values = model
            .variables
            .iter()
            .map(|key| (*key, self.values.get(key).copied().unwrap_or(0.0)))
            .collect();
        SolverOutput::solved(self.status.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> AssignmentModel {
        AssignmentModel {
            variables: vec![VarKey::new(1, 1), VarKey::new(1, 2)],
            constraints: vec![],
        }
    }

    #[test]
    fn test_replays_plan() {
        let plan = BinarySolution::new().with_one(1, 2);
        let output = FixedSolver::new(&plan).solve(&model());

        assert_eq!(output.status, SolverStatus::Optimal);
        assert_eq!(output.values.len(), 2);
        let expected: BinarySolution = [(VarKey::new(1, 1), 0), (VarKey::new(1, 2), 1)]
            .into_iter()
            .collect();
        assert_eq!(output.rounded(), expected);
    }

    #[test]
    fn test_infeasible() {
        let output = FixedSolver::infeasible().solve(&model());
        assert_eq!(output.status, SolverStatus::Infeasible);
        assert!(output.values.is_empty());
    }
}
