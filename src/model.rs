//! Assignment model formulation.
//!
//! Translates an aggregated roster and a [`Policy`] into a binary linear
//! model: one 0/1 variable per (team, vehicle) pair meaning "team rides in
//! vehicle", plus five constraint families:
//!
//! | Family | Per | Form |
//! |--------|-----|------|
//! | Single assignment | team | Σ_v x(t,v) = 1 |
//! | Capacity | vehicle | Σ_t x(t,v)·movable(t) ≤ capacity(v) − pinned(v) |
//! | Faction balance | vehicle | −K ≤ Σ_t x(t,v)·faction(t) ≤ K |
//! | Minors cap | vehicle | Σ_t x(t,v)·minors(t) ≤ max_minors |
//! | Certified floor | vehicle | Σ_t x(t,v)·certified(t) ≥ min_certified |
//!
//! There is no objective: any assignment satisfying every constraint is
//! acceptable. The model is a plain data structure, independent of any
//! solver library, so it can be evaluated against a candidate solution
//! directly.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Policy;
use crate::models::{EntityMap, Roster, Team, TeamId, VehicleId};

/// Index of a decision variable: "team `team_id` rides in `vehicle_id`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarKey {
    pub team_id: TeamId,
    pub vehicle_id: VehicleId,
}

impl VarKey {
    pub fn new(team_id: TeamId, vehicle_id: VehicleId) -> Self {
        Self { team_id, vehicle_id }
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x_t{}_v{}", self.team_id, self.vehicle_id)
    }
}

/// Comparison operator of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// `lhs <= bound`
    Le,
    /// `lhs >= bound`
    Ge,
    /// `lhs == bound`
    Eq,
}

impl Comparison {
    #[inline]
    pub fn holds(&self, lhs: i64, bound: i64) -> bool {
        match self {
            Self::Le => lhs <= bound,
            Self::Ge => lhs >= bound,
            Self::Eq => lhs == bound,
        }
    }

    fn lp_symbol(&self) -> &'static str {
        match self {
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "=",
        }
    }
}

/// Constraint family, with the entity it is stated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    SingleAssignment { team_id: TeamId },
    Capacity { vehicle_id: VehicleId },
    FactionUpper { vehicle_id: VehicleId },
    FactionLower { vehicle_id: VehicleId },
    MinorsCap { vehicle_id: VehicleId },
    MinCertified { vehicle_id: VehicleId },
}

impl ConstraintKind {
    /// Stable constraint name, used in LP dumps and logs.
    pub fn name(&self) -> String {
        match self {
            Self::SingleAssignment { team_id } => format!("single_t{team_id}"),
            Self::Capacity { vehicle_id } => format!("capacity_v{vehicle_id}"),
            Self::FactionUpper { vehicle_id } => format!("faction_max_v{vehicle_id}"),
            Self::FactionLower { vehicle_id } => format!("faction_min_v{vehicle_id}"),
            Self::MinorsCap { vehicle_id } => format!("minors_v{vehicle_id}"),
            Self::MinCertified { vehicle_id } => format!("certified_v{vehicle_id}"),
        }
    }
}

/// `Σ coef·x  op  bound` over the model's variables.
///
/// Terms with a zero coefficient are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub kind: ConstraintKind,
    pub terms: Vec<(VarKey, i64)>,
    pub op: Comparison,
    pub bound: i64,
}

impl LinearConstraint {
    /// Left-hand side under a 0/1 solution.
    pub fn lhs(&self, solution: &BinarySolution) -> i64 {
        self.terms
            .iter()
            .map(|(key, coef)| coef * i64::from(solution.get(*key)))
            .sum()
    }

    pub fn is_satisfied(&self, solution: &BinarySolution) -> bool {
        self.op.holds(self.lhs(solution), self.bound)
    }
}

/// A 0/1 value per decision variable. Missing keys read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinarySolution {
    values: HashMap<VarKey, u8>,
}

impl BinarySolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable; any non-zero value is stored as 1.
    pub fn set(&mut self, key: VarKey, value: u8) {
        self.values.insert(key, u8::from(value != 0));
    }

    /// Builder-style `set(key, 1)`.
    pub fn with_one(mut self, team_id: TeamId, vehicle_id: VehicleId) -> Self {
        self.set(VarKey::new(team_id, vehicle_id), 1);
        self
    }

    #[inline]
    pub fn get(&self, key: VarKey) -> u8 {
        self.values.get(&key).copied().unwrap_or(0)
    }

    /// Variables set to 1, in key order.
    pub fn ones(&self) -> Vec<VarKey> {
        let mut ones: Vec<VarKey> = self
            .values
            .iter()
            .filter(|(_, &v)| v == 1)
            .map(|(k, _)| *k)
            .collect();
        ones.sort();
        ones
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(VarKey, u8)> for BinarySolution {
    fn from_iter<I: IntoIterator<Item = (VarKey, u8)>>(iter: I) -> Self {
        let mut solution = Self::new();
        for (key, value) in iter {
            solution.set(key, value);
        }
        solution
    }
}

/// Binary decision variables and linear constraints of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentModel {
    /// Variables, team-major in roster load order.
    pub variables: Vec<VarKey>,
    pub constraints: Vec<LinearConstraint>,
}

impl AssignmentModel {
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Constraints a solution violates.
    pub fn violations<'a>(&'a self, solution: &BinarySolution) -> Vec<&'a LinearConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(solution))
            .collect()
    }

    pub fn is_satisfied_by(&self, solution: &BinarySolution) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(solution))
    }

    /// Renders the model in CPLEX LP text format.
    ///
    /// The objective is the constant zero. Constraints without terms are
    /// emitted as comments since LP syntax cannot express them.
    pub fn to_lp(&self) -> String {
        let mut out = String::from("\\ u-convoy assignment model\nMinimize\n obj:");
        match self.variables.first() {
            Some(first) => {
                let _ = writeln!(out, " 0 {first}");
            }
            None => out.push('\n'),
        }

        out.push_str("Subject To\n");
        for c in &self.constraints {
            let name = c.kind.name();
            if c.terms.is_empty() {
                let _ = writeln!(out, "\\ {name}: 0 {} {}", c.op.lp_symbol(), c.bound);
                continue;
            }
            let _ = write!(out, " {name}:");
            for (key, coef) in &c.terms {
                let sign = if *coef < 0 { '-' } else { '+' };
                match coef.abs() {
                    1 => {
                        let _ = write!(out, " {sign} {key}");
                    }
                    n => {
                        let _ = write!(out, " {sign} {n} {key}");
                    }
                }
            }
            let _ = writeln!(out, " {} {}", c.op.lp_symbol(), c.bound);
        }

        out.push_str("Binary\n");
        for key in &self.variables {
            let _ = writeln!(out, " {key}");
        }
        out.push_str("End\n");
        out
    }
}

/// Builds an [`AssignmentModel`] from an aggregated roster.
///
/// # Example
/// ```
/// use u_convoy::aggregate::aggregate;
/// use u_convoy::model::AssignmentModelBuilder;
/// use u_convoy::models::{Person, Role, Roster, Team, Vehicle};
///
/// let mut roster = Roster::from_parts(
///     vec![Person::new(1, Role::Certified).with_team(1)],
///     vec![Team::new(1)],
///     vec![Vehicle::new(1, 10), Vehicle::new(2, 10)],
/// ).unwrap();
/// aggregate(&mut roster).unwrap();
///
/// let model = AssignmentModelBuilder::new(&roster).build();
/// assert_eq!(model.variable_count(), 2);
/// ```
pub struct AssignmentModelBuilder<'a> {
    roster: &'a Roster,
    policy: Policy,
}

impl<'a> AssignmentModelBuilder<'a> {
    /// Creates a builder with the default policy.
    pub fn new(roster: &'a Roster) -> Self {
        Self {
            roster,
            policy: Policy::default(),
        }
    }

    /// Sets the policy thresholds.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the model. Expects derived fields to be filled by
    /// [`aggregate`](crate::aggregate::aggregate).
    pub fn build(&self) -> AssignmentModel {
        let teams = &self.roster.teams;
        let vehicles = &self.roster.vehicles;
        let mut model = AssignmentModel::default();

        for team in teams {
            for vehicle in vehicles {
                model.variables.push(VarKey::new(team.id, vehicle.id));
            }
        }

        // 1. Teams are never split
        for team in teams {
            model.constraints.push(LinearConstraint {
                kind: ConstraintKind::SingleAssignment { team_id: team.id },
                terms: vehicles.ids().map(|v| (VarKey::new(team.id, v), 1)).collect(),
                op: Comparison::Eq,
                bound: 1,
            });
        }

        for vehicle in vehicles {
            let v = vehicle.id;

            // 2. Movable members fit in the seats left after manual pins
            model.constraints.push(LinearConstraint {
                kind: ConstraintKind::Capacity { vehicle_id: v },
                terms: per_vehicle(teams, v, |t| t.stats.movable_count()),
                op: Comparison::Le,
                bound: vehicle.free_seats(),
            });

            // 3. Faction balance band
            let faction_terms = per_vehicle(teams, v, |t| t.faction);
            model.constraints.push(LinearConstraint {
                kind: ConstraintKind::FactionUpper { vehicle_id: v },
                terms: faction_terms.clone(),
                op: Comparison::Le,
                bound: self.policy.faction_band,
            });
            model.constraints.push(LinearConstraint {
                kind: ConstraintKind::FactionLower { vehicle_id: v },
                terms: faction_terms,
                op: Comparison::Ge,
                bound: -self.policy.faction_band,
            });

            // 4. Minors cap
            model.constraints.push(LinearConstraint {
                kind: ConstraintKind::MinorsCap { vehicle_id: v },
                terms: per_vehicle(teams, v, |t| i64::from(t.stats.minor_count)),
                op: Comparison::Le,
                bound: i64::from(self.policy.max_minors_per_vehicle),
            });

            // 5. Certified floor
            model.constraints.push(LinearConstraint {
                kind: ConstraintKind::MinCertified { vehicle_id: v },
                terms: per_vehicle(teams, v, |t| i64::from(t.stats.certified_count)),
                op: Comparison::Ge,
                bound: i64::from(self.policy.min_certified_per_vehicle),
            });
        }

        debug!(
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            "assignment model built"
        );
        model
    }
}

/// Non-zero `coef(team)` terms of every team's variable for one vehicle.
fn per_vehicle(
    teams: &EntityMap<Team>,
    vehicle_id: VehicleId,
    coef: impl Fn(&Team) -> i64,
) -> Vec<(VarKey, i64)> {
    teams
        .iter()
        .map(|t| (VarKey::new(t.id, vehicle_id), coef(t)))
        .filter(|(_, c)| *c != 0)
        .collect()
}
