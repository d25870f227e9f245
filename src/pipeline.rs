//! End-to-end allocation run.
//!
//! # Stages
//!
//! 1. Aggregate the roster (fails fast on dangling references and
//!    over-full manual baselines, before any solver work).
//! 2. Build the binary assignment model; optionally dump it as LP text.
//! 3. Solve. `Infeasible` and solver errors end the run here.
//! 4. Round the raw values, resolve them into entity fields.
//! 5. Audit the resolved roster; a plan that breaks a policy bound is
//!    never exported.
//! 6. Project the report.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::aggregate::{aggregate, RosterSummary};
use crate::config::{ConvoyConfig, Policy};
use crate::error::{ConvoyError, Result};
use crate::io::{load_roster, write_report};
use crate::model::AssignmentModelBuilder;
use crate::models::Roster;
use crate::report::{audit, AllocationReport, FleetKpi};
use crate::resolve::resolve;
use crate::solver::{solver_for, AssignmentSolver, MilpSolver, SolverStatus};
use crate::validation::{validate_roster, ValidationError};

/// Runs the allocation stages against a roster.
///
/// # Example
/// ```
/// use u_convoy::models::{Person, Role, Roster, Team, Vehicle};
/// use u_convoy::pipeline::Planner;
/// use u_convoy::solver::SearchSolver;
///
/// let mut roster = Roster::from_parts(
///     vec![
///         Person::new(1, Role::Certified).with_team(1),
///         Person::new(2, Role::New).with_team(1),
///     ],
///     vec![Team::new(1)],
///     vec![Vehicle::new(1, 4)],
/// ).unwrap();
///
/// let report = Planner::new()
///     .with_solver(SearchSolver::new())
///     .run(&mut roster)
///     .unwrap();
/// assert_eq!(report.vehicles[0].occupied_seats, 2);
/// ```
pub struct Planner {
    policy: Policy,
    solver: Box<dyn AssignmentSolver>,
    model_dump: Option<PathBuf>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    /// Default policy, MILP backend.
    pub fn new() -> Self {
        Self {
            policy: Policy::default(),
            solver: Box::new(MilpSolver::new()),
            model_dump: None,
        }
    }

    /// Policy, backend and model dump taken from a configuration.
    pub fn from_config(config: &ConvoyConfig) -> Self {
        Self {
            policy: config.policy,
            solver: solver_for(&config.solver),
            model_dump: config.output.model_dump.clone(),
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_solver(mut self, solver: impl AssignmentSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Writes the model in LP format to `path` before solving.
    pub fn with_model_dump(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_dump = Some(path.into());
        self
    }

    /// Allocates every team to a vehicle and writes the outcome into the
    /// roster's output fields.
    ///
    /// On error the roster's output fields keep their previous values.
    pub fn run(&self, roster: &mut Roster) -> Result<AllocationReport> {
        aggregate(roster)?;
        log_summary(&RosterSummary::from_roster(roster));

        let model = AssignmentModelBuilder::new(roster)
            .with_policy(self.policy)
            .build();
        if let Some(path) = &self.model_dump {
            fs::write(path, model.to_lp())?;
            info!(path = %path.display(), "model written");
        }

        let solver = self.solver.name();
        let output = self.solver.solve(&model);
        info!(solver, status = %output.status, "solver finished");
        match &output.status {
            SolverStatus::Optimal | SolverStatus::Feasible => {}
            SolverStatus::Infeasible => {
                return Err(ConvoyError::NoFeasibleAssignment {
                    solver: solver.to_string(),
                })
            }
            SolverStatus::Error(msg) => return Err(ConvoyError::Solver(msg.clone())),
        }

        let solution = output.rounded();
        for key in solution.ones() {
            debug!(var = %key, "x = 1");
        }

        let mut candidate = roster.clone();
        resolve(&mut candidate, &solution)?;
        let issues = audit(&candidate, &self.policy);
        if !issues.is_empty() {
            return Err(ConvoyError::AuditFailed(issues.join("; ")));
        }
        *roster = candidate;

        log_fleet(&FleetKpi::calculate(roster));
        Ok(AllocationReport::from_roster(roster))
    }
}

fn log_summary(summary: &RosterSummary) {
    info!(
        total_seats = summary.total_seats,
        people = summary.people,
        new = summary.new,
        certified = summary.certified,
        volunteers = summary.volunteers,
        organizers = summary.organizers,
        minors = summary.minors,
        pinned = summary.pinned,
        teams = summary.teams,
        vehicles = summary.vehicles,
        "roster loaded"
    );
}

fn log_fleet(kpi: &FleetKpi) {
    let mut fills: Vec<_> = kpi.fill_by_vehicle.iter().collect();
    fills.sort_by_key(|(id, _)| **id);
    for (vehicle_id, rate) in fills {
        info!(vehicle_id, fill_pct = (rate * 100.0).round(), "vehicle fill");
    }
    info!(
        occupied = kpi.occupied_seats,
        seats = kpi.total_seats,
        unseated = kpi.unseated,
        "allocation complete"
    );
}

/// Loads the configured inputs, plans, and writes every export file.
///
/// Returns the report and the written paths.
pub fn run_from_config(config: &ConvoyConfig) -> Result<(AllocationReport, Vec<PathBuf>)> {
    let mut roster = load_roster(&config.input)?;
    let report = Planner::from_config(config).run(&mut roster)?;
    let files = write_report(
        &report,
        &config.output.directory,
        config.input.delimiter_byte(),
    )?;
    Ok((report, files))
}

/// Loads the configured inputs and lists every diagnostic, without solving.
pub fn check_from_config(config: &ConvoyConfig) -> Result<Vec<ValidationError>> {
    let roster = load_roster(&config.input)?;
    log_summary(&RosterSummary::from_roster(&roster));
    Ok(validate_roster(&roster, &config.policy))
}
