//! Solver adapters.
//!
//! A solver takes an [`AssignmentModel`] and returns a status plus a raw
//! value per variable. The rest of the crate only sees this boundary, so
//! backends are interchangeable:
//!
//! - [`MilpSolver`]: mixed-integer programming through `good_lp`
//! - [`SearchSolver`]: deterministic depth-first search with bound pruning
//! - [`FixedSolver`]: replays a precomputed 0/1 plan
//!
//! Raw values may carry floating-point noise; [`SolverOutput::rounded`]
//! snaps them to the nearest integer before anything reads them as 0/1.

mod fixed;
mod milp;
mod search;

use std::collections::HashMap;
use std::fmt;

use crate::config::{Backend, SolverSettings};
use crate::model::{AssignmentModel, BinarySolution, VarKey};

pub use fixed::FixedSolver;
pub use milp::MilpSolver;
pub use search::SearchSolver;

/// Verdict of a solver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverStatus {
    /// Proven optimal (for a feasibility model: any feasible point).
    Optimal,
    /// Feasible, optimality not proven.
    Feasible,
    /// No assignment satisfies the constraints.
    Infeasible,
    /// The backend failed or gave up (e.g. limit reached).
    Error(String),
}

impl SolverStatus {
    /// Whether variable values are available.
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => f.write_str("optimal"),
            Self::Feasible => f.write_str("feasible"),
            Self::Infeasible => f.write_str("infeasible"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Raw result of a solver run.
#[derive(Debug, Clone)]
pub struct SolverOutput {
    pub status: SolverStatus,
    /// Raw variable values. Empty unless `status.is_solved()`.
    pub values: HashMap<VarKey, f64>,
}

impl SolverOutput {
    pub fn solved(status: SolverStatus, values: HashMap<VarKey, f64>) -> Self {
        Self { status, values }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolverStatus::Infeasible,
            values: HashMap::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SolverStatus::Error(message.into()),
            values: HashMap::new(),
        }
    }

    /// Values rounded to the nearest integer.
    ///
    /// Anything that rounds to 1 is a 1; everything else (0, or a value
    /// far enough off to round elsewhere) is a 0.
    pub fn rounded(&self) -> BinarySolution {
        self.values
            .iter()
            .map(|(key, value)| (*key, u8::from(value.round() == 1.0)))
            .collect()
    }
}

/// A backend able to solve an [`AssignmentModel`].
pub trait AssignmentSolver {
    /// Backend name, used in logs and errors.
    fn name(&self) -> &str;

    /// Solves the model. Blocks until done or a configured limit is hit.
    fn solve(&self, model: &AssignmentModel) -> SolverOutput;
}

/// Instantiates the backend selected in the settings.
pub fn solver_for(settings: &SolverSettings) -> Box<dyn AssignmentSolver> {
    match settings.backend {
        Backend::Milp => Box::new(MilpSolver::new()),
        Backend::Search => {
            let mut solver = SearchSolver::new();
            if let Some(limit) = settings.time_limit() {
                solver = solver.with_time_limit(limit);
            }
            if let Some(nodes) = settings.node_limit {
                solver = solver.with_node_limit(nodes);
            }
            Box::new(solver)
        }
    }
}

/// Checks constraints whose terms are all empty.
///
/// Returns `false` if one of them can never hold, which makes the whole
/// model infeasible regardless of the variables.
pub(crate) fn constant_constraints_hold(model: &AssignmentModel) -> bool {
    model
        .constraints
        .iter()
        .filter(|c| c.terms.is_empty())
        .all(|c| c.op.holds(0, c.bound))
}
