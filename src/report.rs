//! Result projection, audit, and fleet indicators.
//!
//! [`AllocationReport`] is a lossless, decision-free view of a resolved
//! roster:
//!
//! | Table | One row per | Order |
//! |-------|-------------|-------|
//! | People | person | load order |
//! | Vehicles | vehicle | load order |
//! | Manifest | person resolved to the vehicle | load order, numbered from 1 |
//!
//! [`audit`] re-checks the resolved roster against the policy, and
//! [`FleetKpi`] summarises how full the fleet is.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::RosterSummary;
use crate::config::Policy;
use crate::models::{PersonId, Roster, TeamId, VehicleId};

/// Export row for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRow {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub new: bool,
    pub certified: bool,
    pub organizer: bool,
    pub volunteer: bool,
    pub adult: bool,
    pub team_id: Option<TeamId>,
    pub manual_vehicle_id: Option<VehicleId>,
    pub assigned_vehicle_id: Option<VehicleId>,
}

/// Summary row for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub id: VehicleId,
    pub capacity: u32,
    pub manual_occupants: u32,
    pub occupied_seats: i64,
    /// Assigned teams in resolution order.
    pub team_ids: Vec<TeamId>,
}

/// One line of a vehicle manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// 1-based position within the vehicle.
    pub seq: usize,
    pub person_id: PersonId,
    pub first_name: String,
    pub last_name: String,
    /// Team name, empty for people without a team.
    pub team: String,
    pub phone: String,
}

/// Passenger list of one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub vehicle_id: VehicleId,
    pub rows: Vec<ManifestRow>,
}

/// Complete export of a resolved run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub summary: RosterSummary,
    pub people: Vec<PersonRow>,
    pub vehicles: Vec<VehicleSummary>,
    pub manifests: Vec<Manifest>,
}

impl AllocationReport {
    /// Projects a resolved roster.
    pub fn from_roster(roster: &Roster) -> Self {
        let people = roster
            .people
            .iter()
            .map(|p| PersonRow {
                id: p.id,
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
                email: p.email.clone(),
                phone: p.phone.clone(),
                new: p.role.is_new(),
                certified: p.role.is_certified(),
                organizer: p.role.is_organizer(),
                volunteer: p.role.is_volunteer(),
                adult: p.is_adult,
                team_id: p.team_id,
                manual_vehicle_id: p.manual_vehicle_id,
                assigned_vehicle_id: p.assigned_vehicle_id,
            })
            .collect();

        let vehicles = roster
            .vehicles
            .iter()
            .map(|v| VehicleSummary {
                id: v.id,
                capacity: v.capacity,
                manual_occupants: v.manual_occupant_count,
                occupied_seats: v.occupied_seats,
                team_ids: v.assigned_team_ids.clone(),
            })
            .collect();

        let manifests = roster
            .vehicles
            .ids()
            .map(|vehicle_id| Manifest {
                vehicle_id,
                rows: roster
                    .occupants_of(vehicle_id)
                    .enumerate()
                    .map(|(i, p)| ManifestRow {
                        seq: i + 1,
                        person_id: p.id,
                        first_name: p.first_name.clone(),
                        last_name: p.last_name.clone(),
                        team: p
                            .team_id
                            .and_then(|t| roster.teams.get(t))
                            .map(|t| t.name.clone())
                            .unwrap_or_default(),
                        phone: p.phone.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            summary: RosterSummary::from_roster(roster),
            people,
            vehicles,
            manifests,
        }
    }

    /// Manifest of one vehicle.
    pub fn manifest(&self, vehicle_id: VehicleId) -> Option<&Manifest> {
        self.manifests.iter().find(|m| m.vehicle_id == vehicle_id)
    }

    /// Largest number of teams on a single vehicle.
    pub fn max_teams_per_vehicle(&self) -> usize {
        self.vehicles
            .iter()
            .map(|v| v.team_ids.len())
            .max()
            .unwrap_or(0)
    }
}

/// Re-checks a resolved roster; returns one message per broken property.
///
/// Checked per team: exactly one vehicle. Per vehicle: seats, faction
/// band, minors cap, certified floor. Per person: pin honoured, team
/// vehicle inherited, teamless unpinned people left unassigned.
pub fn audit(roster: &Roster, policy: &Policy) -> Vec<String> {
    let mut issues = Vec::new();

    #[derive(Default)]
    struct Load {
        faction: i64,
        minors: i64,
        certified: i64,
    }
    let mut loads: HashMap<VehicleId, Load> = HashMap::new();

    for team in &roster.teams {
        let Some(vehicle_id) = team.assigned_vehicle_id else {
            issues.push(format!("team {} has no vehicle", team.id));
            continue;
        };
        let listed = roster
            .vehicles
            .iter()
            .filter(|v| v.assigned_team_ids.contains(&team.id))
            .count();
        if listed != 1 {
            issues.push(format!("team {} is listed on {listed} vehicles", team.id));
        }
        let load = loads.entry(vehicle_id).or_default();
        load.faction += team.faction;
        load.minors += i64::from(team.stats.minor_count);
        load.certified += i64::from(team.stats.certified_count);
    }

    for vehicle in &roster.vehicles {
        let load = loads.remove(&vehicle.id).unwrap_or_default();
        if vehicle.occupied_seats > i64::from(vehicle.capacity) {
            issues.push(format!(
                "vehicle {} seats {} for capacity {}",
                vehicle.id, vehicle.occupied_seats, vehicle.capacity
            ));
        }
        if load.faction.abs() > policy.faction_band {
            issues.push(format!(
                "vehicle {} faction sum {} outside band {}",
                vehicle.id, load.faction, policy.faction_band
            ));
        }
        if load.minors > i64::from(policy.max_minors_per_vehicle) {
            issues.push(format!(
                "vehicle {} carries {} minors, limit {}",
                vehicle.id, load.minors, policy.max_minors_per_vehicle
            ));
        }
        if load.certified < i64::from(policy.min_certified_per_vehicle) {
            issues.push(format!(
                "vehicle {} carries {} certified members, floor {}",
                vehicle.id, load.certified, policy.min_certified_per_vehicle
            ));
        }
    }

    for person in &roster.people {
        let expected = person.manual_vehicle_id.or_else(|| {
            person
                .team_id
                .and_then(|t| roster.teams.get(t))
                .and_then(|t| t.assigned_vehicle_id)
        });
        if person.assigned_vehicle_id != expected {
            issues.push(format!(
                "person {} resolved to {:?}, expected {:?}",
                person.id, person.assigned_vehicle_id, expected
            ));
        }
    }

    issues
}

/// Fleet fill indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetKpi {
    /// Occupied seats across the fleet.
    pub occupied_seats: i64,
    /// Seats across the fleet.
    pub total_seats: u64,
    /// Mean per-vehicle fill rate (0.0..=1.0).
    pub avg_fill_rate: f64,
    /// Fullest vehicle's fill rate.
    pub max_fill_rate: f64,
    /// Per-vehicle fill rate.
    pub fill_by_vehicle: HashMap<VehicleId, f64>,
    /// People without a resolved vehicle.
    pub unseated: usize,
}

impl FleetKpi {
    pub fn calculate(roster: &Roster) -> Self {
        let fill_by_vehicle: HashMap<VehicleId, f64> = roster
            .vehicles
            .iter()
            .map(|v| (v.id, v.fill_rate()))
            .collect();
        let avg_fill_rate = if fill_by_vehicle.is_empty() {
            0.0
        } else {
            fill_by_vehicle.values().sum::<f64>() / fill_by_vehicle.len() as f64
        };
        let max_fill_rate = fill_by_vehicle.values().copied().fold(0.0, f64::max);

        Self {
            occupied_seats: roster.vehicles.iter().map(|v| v.occupied_seats).sum(),
            total_seats: roster.total_capacity(),
            avg_fill_rate,
            max_fill_rate,
            fill_by_vehicle,
            unseated: roster
                .people
                .iter()
                .filter(|p| p.assigned_vehicle_id.is_none())
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::model::BinarySolution;
    use crate::models::{Person, Role, Team, Vehicle};
    use crate::resolve::resolve;

    fn resolved_roster() -> Roster {
        let mut roster = Roster::from_parts(
            vec![
                Person::new(1, Role::Certified)
                    .with_name("Alice", "Martin")
                    .with_contact("alice@example.org", "0601")
                    .with_team(1),
                Person::new(2, Role::Volunteer).with_name("Bob", "Petit"),
                Person::new(3, Role::New).with_name("Chloe", "Durand").with_team(2).minor(),
                Person::new(4, Role::Certified).with_name("Dan", "Roux").with_team(2),
                Person::new(5, Role::Organizer)
                    .with_name("Eve", "Blanc")
                    .with_manual_vehicle(1),
            ],
            vec![
                Team::new(1).with_name("Foxes").with_faction(1),
                Team::new(2).with_name("Owls").with_faction(-1),
            ],
            vec![Vehicle::new(1, 4), Vehicle::new(2, 3)],
        )
        .unwrap();
        aggregate(&mut roster).unwrap();
        resolve(&mut roster, &BinarySolution::new().with_one(1, 1).with_one(2, 2)).unwrap();
        roster
    }

    #[test]
    fn test_person_rows() {
        let report = AllocationReport::from_roster(&resolved_roster());
        assert_eq!(report.people.len(), 5);

        let alice = &report.people[0];
        assert_eq!(alice.email, "alice@example.org");
        assert!(alice.certified && !alice.new && !alice.organizer && !alice.volunteer);
        assert_eq!(alice.assigned_vehicle_id, Some(1));

        let bob = &report.people[1];
        assert!(bob.volunteer);
        assert_eq!(bob.team_id, None);
        assert_eq!(bob.assigned_vehicle_id, None);

        let eve = &report.people[4];
        assert_eq!(eve.manual_vehicle_id, Some(1));
        assert_eq!(eve.assigned_vehicle_id, Some(1));
    }

    #[test]
    fn test_vehicle_summaries() {
        let report = AllocationReport::from_roster(&resolved_roster());
        assert_eq!(report.vehicles[0].team_ids, vec![1]);
        assert_eq!(report.vehicles[0].occupied_seats, 2);
        assert_eq!(report.vehicles[0].manual_occupants, 1);
        assert_eq!(report.vehicles[1].team_ids, vec![2]);
        assert_eq!(report.vehicles[1].occupied_seats, 2);
        assert_eq!(report.max_teams_per_vehicle(), 1);
    }

    #[test]
    fn test_manifests_numbered_per_vehicle() {
        let report = AllocationReport::from_roster(&resolved_roster());

        let m1 = report.manifest(1).unwrap();
        let names: Vec<_> = m1.rows.iter().map(|r| r.first_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Eve"]);
        assert_eq!(m1.rows.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(m1.rows[0].team, "Foxes");
        assert_eq!(m1.rows[1].team, "");

        let m2 = report.manifest(2).unwrap();
        assert_eq!(m2.rows.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(m2.rows[0].person_id, 3);
        assert_eq!(m2.rows[1].team, "Owls");
    }

    #[test]
    fn test_report_serializes() {
        let report = AllocationReport::from_roster(&resolved_roster());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["people"], 5);
        assert_eq!(json["vehicles"][1]["team_ids"][0], 2);
        assert!(json["people"][1]["assigned_vehicle_id"].is_null());
    }

    #[test]
    fn test_audit_clean() {
        let roster = resolved_roster();
        assert!(audit(&roster, &Policy::default()).is_empty());
    }

    #[test]
    fn test_audit_flags_policy_breaches() {
        let mut roster = resolved_roster();
        roster.vehicles.get_mut(2).unwrap().occupied_seats = 9;
        roster.people.get_mut(2).unwrap().assigned_vehicle_id = Some(2);

        let policy = Policy::default().with_faction_band(0).with_max_minors(0);
        let issues = audit(&roster, &policy);
        assert!(issues.iter().any(|i| i.contains("seats 9")));
        assert!(issues.iter().any(|i| i.contains("faction sum")));
        assert!(issues.iter().any(|i| i.contains("minors")));
        assert!(issues.iter().any(|i| i.starts_with("person 2")));
    }

    #[test]
    fn test_fleet_kpi() {
        let kpi = FleetKpi::calculate(&resolved_roster());
        assert_eq!(kpi.occupied_seats, 4);
        assert_eq!(kpi.total_seats, 7);
        assert_eq!(kpi.unseated, 1);
        assert!((kpi.fill_by_vehicle[&1] - 0.5).abs() < 1e-10);
        assert!((kpi.max_fill_rate - 2.0 / 3.0).abs() < 1e-10);
        assert!((kpi.avg_fill_rate - (0.5 + 2.0 / 3.0) / 2.0).abs() < 1e-10);
    }
}
