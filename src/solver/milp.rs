//! Mixed-integer programming backend.
//!
//! Hands the model to `good_lp` with binary variables and a constant
//! objective. The pure-Rust `microlp` solver is the only backend
//! compiled in, so `default_solver` resolves to it.

use std::collections::HashMap;

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel, Variable,
};
use tracing::debug;

use super::{constant_constraints_hold, AssignmentSolver, SolverOutput, SolverStatus};
use crate::model::{AssignmentModel, Comparison, VarKey};

/// Solves the assignment model as a 0/1 integer program.
#[derive(Debug, Clone, Default)]
pub struct MilpSolver;

impl MilpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl AssignmentSolver for MilpSolver {
    fn name(&self) -> &str {
        "milp"
    }

    fn solve(&self, model: &AssignmentModel) -> SolverOutput {
        // Empty-sided constraints are decided here; LP backends reject them
        if !constant_constraints_hold(model) {
            return SolverOutput::infeasible();
        }
        if model.variables.is_empty() {
            return SolverOutput::solved(SolverStatus::Optimal, HashMap::new());
        }

        let mut vars = variables!();
        let handles: HashMap<VarKey, Variable> = model
            .variables
            .iter()
            .map(|key| (*key, vars.add(variable().binary().name(key.to_string()))))
            .collect();

        let mut problem = vars.minimise(Expression::from(0.0)).using(default_solver);

        for c in model.constraints.iter().filter(|c| !c.terms.is_empty()) {
            let mut lhs = Expression::from(0.0);
            for (key, coef) in &c.terms {
                match handles.get(key) {
                    Some(var) => lhs = lhs + (*coef as f64) * *var,
                    None => {
                        return SolverOutput::error(format!(
                            "constraint {} references unknown variable {key}",
                            c.kind.name()
                        ))
                    }
                }
            }
            let rhs = c.bound as f64;
            problem = match c.op {
                Comparison::Le => problem.with(constraint!(lhs <= rhs)),
                Comparison::Ge => problem.with(constraint!(lhs >= rhs)),
                Comparison::Eq => problem.with(constraint!(lhs == rhs)),
            };
        }

        match problem.solve() {
            Ok(solution) => {
                let values: HashMap<VarKey, f64> = handles
                    .iter()
                    .map(|(key, var)| (*key, solution.value(*var)))
                    .collect();
                debug!(variables = values.len(), "milp solved");
                SolverOutput::solved(SolverStatus::Optimal, values)
            }
            Err(ResolutionError::Infeasible) => SolverOutput::infeasible(),
            Err(e) => SolverOutput::error(e.to_string()),
        }
    }
}
