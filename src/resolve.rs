//! Assignment resolution.
//!
//! Turns a solved 0/1 plan back into entity fields:
//!
//! 1. Each team gets the unique vehicle whose variable is 1. Zero or
//!    several such vehicles means the solver broke the single-assignment
//!    constraint; this is reported, never papered over.
//! 2. Each vehicle lists its teams (team load order) and counts occupied
//!    seats as pinned occupants plus every placed team's movable members.
//! 3. Each person takes their manual vehicle if pinned, else their team's
//!    vehicle, else stays unassigned.
//!
//! All placements are decided before any field is written, so a failed
//! resolution leaves the roster's previous outputs untouched.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConvoyError, Result};
use crate::model::{BinarySolution, VarKey};
use crate::models::{Roster, TeamId, VehicleId};

/// Writes the plan into team, vehicle, and person output fields.
///
/// # Errors
/// `ResolverInvariant` if a team does not resolve to exactly one vehicle.
pub fn resolve(roster: &mut Roster, solution: &BinarySolution) -> Result<()> {
    let vehicle_ids: Vec<VehicleId> = roster.vehicles.ids().collect();

    let mut placements: Vec<(TeamId, VehicleId)> = Vec::with_capacity(roster.teams.len());
    for team in &roster.teams {
        let chosen: Vec<VehicleId> = vehicle_ids
            .iter()
            .copied()
            .filter(|&v| solution.get(VarKey::new(team.id, v)) == 1)
            .collect();
        match chosen.as_slice() {
            [vehicle_id] => placements.push((team.id, *vehicle_id)),
            _ => {
                return Err(ConvoyError::ResolverInvariant {
                    team_id: team.id,
                    vehicles: chosen,
                })
            }
        }
    }

    let team_vehicle: HashMap<TeamId, VehicleId> = placements.iter().copied().collect();

    for team in roster.teams.iter_mut() {
        team.assigned_vehicle_id = team_vehicle.get(&team.id).copied();
    }

    for vehicle in roster.vehicles.iter_mut() {
        vehicle.assigned_team_ids.clear();
        vehicle.occupied_seats = i64::from(vehicle.manual_occupant_count);
    }
    for (team_id, vehicle_id) in &placements {
        let movable = roster
            .teams
            .get(*team_id)
            .map(|t| t.stats.movable_count())
            .unwrap_or(0);
        if let Some(vehicle) = roster.vehicles.get_mut(*vehicle_id) {
            vehicle.assigned_team_ids.push(*team_id);
            vehicle.occupied_seats += movable;
        }
    }

    for person in roster.people.iter_mut() {
        person.assigned_vehicle_id = person
            .manual_vehicle_id
            .or_else(|| person.team_id.and_then(|t| team_vehicle.get(&t).copied()));
    }

    debug!(teams = placements.len(), "assignment resolved");
    Ok(())
}
