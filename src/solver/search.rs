//! Depth-first search backend.
//!
//! # Algorithm
//!
//! 1. Visit variables in model order (team-major), trying 1 before 0.
//! 2. Each constraint tracks its assigned partial sum and the positive and
//!    negative coefficient mass still unassigned, giving an interval
//!    `[sum + neg, sum + pos]` the final left-hand side must fall in.
//! 3. After each assignment, only the constraints touching that variable
//!    are re-checked; a branch is cut as soon as an interval can no
//!    longer meet its bound.
//!
//! The search is exhaustive, so an exhausted tree proves infeasibility,
//! and fully deterministic: the same model always yields the same plan.
//!
//! # Complexity
//! Worst case O(2^n) for n variables; bound pruning keeps typical rosters
//! (tens of teams, a handful of vehicles) well within the limits.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{AssignmentSolver, SolverOutput, SolverStatus};
use crate::model::{AssignmentModel, Comparison, VarKey};

/// Default cap on visited nodes.
const DEFAULT_NODE_LIMIT: u64 = 10_000_000;

/// How often (in nodes) the wall clock is consulted.
const CLOCK_INTERVAL: u64 = 1024;

/// Exhaustive branch-and-prune solver for binary models.
#[derive(Debug, Clone)]
pub struct SearchSolver {
    node_limit: u64,
    time_limit: Option<Duration>,
}

impl Default for SearchSolver {
    fn default() -> Self {
        Self {
            node_limit: DEFAULT_NODE_LIMIT,
            time_limit: None,
        }
    }
}

impl SearchSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives up with an error status after visiting this many nodes.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = nodes;
        self
    }

    /// Gives up with an error status after this much wall-clock time.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl AssignmentSolver for SearchSolver {
    fn name(&self) -> &str {
        "search"
    }

    fn solve(&self, model: &AssignmentModel) -> SolverOutput {
        let mut state = match SearchState::new(model, self) {
            Ok(state) => state,
            Err(msg) => return SolverOutput::error(msg),
        };

        if !state.all_feasible() {
            return SolverOutput::infeasible();
        }

        let outcome = state.dfs(0);
        debug!(nodes = state.nodes, "search finished");
        match outcome {
            Ok(true) => {
                let values: HashMap<VarKey, f64> = model
                    .variables
                    .iter()
                    .zip(&state.values)
                    .map(|(key, v)| (*key, f64::from(*v)))
                    .collect();
                SolverOutput::solved(SolverStatus::Optimal, values)
            }
            Ok(false) => SolverOutput::infeasible(),
            Err(msg) => SolverOutput::error(msg),
        }
    }
}

struct SearchState {
    /// Per variable: (constraint index, coefficient).
    occurrences: Vec<Vec<(usize, i64)>>,
    ops: Vec<Comparison>,
    bounds: Vec<i64>,
    sums: Vec<i64>,
    remaining_pos: Vec<i64>,
    remaining_neg: Vec<i64>,
    values: Vec<u8>,
    nodes: u64,
    node_limit: u64,
    time_limit: Option<Duration>,
    started: Instant,
}

impl SearchState {
    fn new(model: &AssignmentModel, solver: &SearchSolver) -> Result<Self, String> {
        let index: HashMap<VarKey, usize> = model
            .variables
            .iter()
            .enumerate()
            .map(|(i, key)| (*key, i))
            .collect();

        let n = model.constraints.len();
        let mut occurrences = vec![Vec::new(); model.variables.len()];
        let mut remaining_pos = vec![0; n];
        let mut remaining_neg = vec![0; n];

        for (ci, c) in model.constraints.iter().enumerate() {
            for (key, coef) in &c.terms {
                let vi = *index.get(key).ok_or_else(|| {
                    format!("constraint {} references unknown variable {key}", c.kind.name())
                })?;
                occurrences[vi].push((ci, *coef));
                if *coef > 0 {
                    remaining_pos[ci] += coef;
                } else {
                    remaining_neg[ci] += coef;
                }
            }
        }

        Ok(Self {
            occurrences,
            ops: model.constraints.iter().map(|c| c.op).collect(),
            bounds: model.constraints.iter().map(|c| c.bound).collect(),
            sums: vec![0; n],
            remaining_pos,
            remaining_neg,
            values: vec![0; model.variables.len()],
            nodes: 0,
            node_limit: solver.node_limit,
            time_limit: solver.time_limit,
            started: Instant::now(),
        })
    }

    /// Whether constraint `ci` can still be met.
    #[inline]
    fn feasible(&self, ci: usize) -> bool {
        let low = self.sums[ci] + self.remaining_neg[ci];
        let high = self.sums[ci] + self.remaining_pos[ci];
        let bound = self.bounds[ci];
        match self.ops[ci] {
            Comparison::Le => low <= bound,
            Comparison::Ge => high >= bound,
            Comparison::Eq => low <= bound && bound <= high,
        }
    }

    fn all_feasible(&self) -> bool {
        (0..self.ops.len()).all(|ci| self.feasible(ci))
    }

    fn assign(&mut self, vi: usize, value: u8) {
        self.values[vi] = value;
        for &(ci, coef) in &self.occurrences[vi] {
            if coef > 0 {
                self.remaining_pos[ci] -= coef;
            } else {
                self.remaining_neg[ci] -= coef;
            }
            self.sums[ci] += coef * i64::from(value);
        }
    }

    fn unassign(&mut self, vi: usize) {
        let value = self.values[vi];
        for &(ci, coef) in &self.occurrences[vi] {
            if coef > 0 {
                self.remaining_pos[ci] += coef;
            } else {
                self.remaining_neg[ci] += coef;
            }
            self.sums[ci] -= coef * i64::from(value);
        }
        self.values[vi] = 0;
    }

    fn check_limits(&mut self) -> Result<(), String> {
        self.nodes += 1;
        if self.nodes > self.node_limit {
            return Err(format!("node limit of {} reached", self.node_limit));
        }
        if let Some(limit) = self.time_limit {
            if self.nodes % CLOCK_INTERVAL == 0 && self.started.elapsed() > limit {
                return Err(format!("time limit of {limit:?} reached"));
            }
        }
        Ok(())
    }

    /// `Ok(true)` when a full assignment was found, `Ok(false)` when the
    /// subtree is exhausted.
    fn dfs(&mut self, vi: usize) -> Result<bool, String> {
        if vi == self.values.len() {
            return Ok(true);
        }
        for value in [1u8, 0] {
            self.check_limits()?;
            self.assign(vi, value);
            let consistent = self.occurrences[vi]
                .iter()
                .all(|&(ci, _)| self.feasible(ci));
            if consistent && self.dfs(vi + 1)? {
                return Ok(true);
            }
            self.unassign(vi);
        }
        Ok(false)
    }
}
