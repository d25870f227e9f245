//! Aggregation pass.
//!
//! One linear sweep over the people of a roster that fills the derived
//! counters of teams and vehicles, and rejects data the optimizer must
//! never see:
//!
//! - a team reference to an unknown team
//! - a manual pin to an unknown vehicle
//! - a vehicle whose pinned occupants alone exceed its capacity
//!
//! Minors are counted per team only; a minor without a team is not
//! tracked anywhere.
//!
//! Global totals are not accumulated here. [`RosterSummary`] recomputes
//! them from the collections on demand.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConvoyError, Result};
use crate::models::{PersonId, Role, Roster, TeamId, TeamStats, VehicleId};

/// A reference to an entity the roster does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DanglingRef {
    Team { person_id: PersonId, team_id: TeamId },
    Vehicle { person_id: PersonId, vehicle_id: VehicleId },
}

impl From<DanglingRef> for ConvoyError {
    fn from(r: DanglingRef) -> Self {
        match r {
            DanglingRef::Team { person_id, team_id } => {
                ConvoyError::UnknownTeamReference { person_id, team_id }
            }
            DanglingRef::Vehicle {
                person_id,
                vehicle_id,
            } => ConvoyError::UnknownVehicleReference {
                person_id,
                vehicle_id,
            },
        }
    }
}

/// Counters from one sweep over the people. Read-only; shared by the
/// aggregation pass and the diagnostics listing.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub team_stats: HashMap<TeamId, TeamStats>,
    pub pinned: HashMap<VehicleId, u32>,
    /// Known teams with at least one person.
    pub populated: HashSet<TeamId>,
    /// Members with neither team nor pin, in load order.
    pub unseated: Vec<(PersonId, Role)>,
    /// In load order; a person's team reference precedes its pin.
    pub dangling: Vec<DanglingRef>,
}

impl Tally {
    pub(crate) fn of(roster: &Roster) -> Self {
        let mut tally = Self {
            team_stats: roster.teams.ids().map(|id| (id, TeamStats::default())).collect(),
            pinned: roster.vehicles.ids().map(|id| (id, 0)).collect(),
            ..Self::default()
        };

        for person in &roster.people {
            match person.team_id {
                Some(team_id) => match tally.team_stats.get_mut(&team_id) {
                    Some(stats) => {
                        tally.populated.insert(team_id);
                        match person.role {
                            Role::New => stats.new_count += 1,
                            Role::Certified => stats.certified_count += 1,
                            Role::Organizer | Role::Volunteer => {}
                        }
                        if !person.is_adult {
                            stats.minor_count += 1;
                        }
                        if person.is_pinned() {
                            stats.pinned_count += 1;
                        }
                    }
                    None => tally.dangling.push(DanglingRef::Team {
                        person_id: person.id,
                        team_id,
                    }),
                },
                None if person.role.is_member() && !person.is_pinned() => {
                    tally.unseated.push((person.id, person.role));
                }
                None => {}
            }

            if let Some(vehicle_id) = person.manual_vehicle_id {
                match tally.pinned.get_mut(&vehicle_id) {
                    Some(n) => *n += 1,
                    None => tally.dangling.push(DanglingRef::Vehicle {
                        person_id: person.id,
                        vehicle_id,
                    }),
                }
            }
        }

        tally
    }

    pub(crate) fn stats_of(&self, team_id: TeamId) -> TeamStats {
        self.team_stats.get(&team_id).copied().unwrap_or_default()
    }

    pub(crate) fn pinned_in(&self, vehicle_id: VehicleId) -> u32 {
        self.pinned.get(&vehicle_id).copied().unwrap_or(0)
    }
}

/// Fills `Team::stats` and `Vehicle::manual_occupant_count`.
///
/// Derived fields are recomputed from scratch, so running the pass twice
/// yields the same counters. Nothing is written when an error is returned.
///
/// # Errors
/// `UnknownTeamReference`, `UnknownVehicleReference` (the first in load
/// order), `OverCapacity`.
pub fn aggregate(roster: &mut Roster) -> Result<()> {
    let tally = Tally::of(roster);
    if let Some(&first) = tally.dangling.first() {
        return Err(first.into());
    }
    if let Some(vehicle) = roster
        .vehicles
        .iter()
        .find(|v| tally.pinned_in(v.id) > v.capacity)
    {
        return Err(ConvoyError::OverCapacity {
            vehicle_id: vehicle.id,
            pinned: tally.pinned_in(vehicle.id),
            capacity: vehicle.capacity,
        });
    }

    for (person_id, role) in &tally.unseated {
        warn!(
            person_id,
            ?role,
            "member has neither team nor manual vehicle and will not be seated"
        );
    }

    for team in roster.teams.iter_mut() {
        team.stats = tally.stats_of(team.id);
    }
    for vehicle in roster.vehicles.iter_mut() {
        vehicle.manual_occupant_count = tally.pinned_in(vehicle.id);
    }

    debug!(
        teams = roster.teams.len(),
        vehicles = roster.vehicles.len(),
        "aggregation complete"
    );
    Ok(())
}

/// Global reporting totals of a roster.
///
/// A pure function of the collections; it has no influence on assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    /// Seats across the fleet.
    pub total_seats: u64,
    /// Number of people.
    pub people: usize,
    pub new: usize,
    pub certified: usize,
    pub volunteers: usize,
    pub organizers: usize,
    /// People who are not adults, with or without a team.
    pub minors: usize,
    /// People with a manual vehicle pin.
    pub pinned: usize,
    pub teams: usize,
    pub vehicles: usize,
    /// People holding a resolved vehicle.
    pub seated: usize,
}

impl RosterSummary {
    /// Computes totals from a roster.
    pub fn from_roster(roster: &Roster) -> Self {
        let mut summary = Self {
            total_seats: roster.total_capacity(),
            people: roster.people.len(),
            teams: roster.teams.len(),
            vehicles: roster.vehicles.len(),
            ..Self::default()
        };

        for person in &roster.people {
            match person.role {
                Role::New => summary.new += 1,
                Role::Certified => summary.certified += 1,
                Role::Volunteer => summary.volunteers += 1,
                Role::Organizer => summary.organizers += 1,
            }
            if !person.is_adult {
                summary.minors += 1;
            }
            if person.is_pinned() {
                summary.pinned += 1;
            }
            if person.assigned_vehicle_id.is_some() {
                summary.seated += 1;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Person, Team, Vehicle};

    fn sample_roster() -> Roster {
        Roster::from_parts(
            vec![
                Person::new(1, Role::New).with_team(10),
                Person::new(2, Role::New).with_team(10).minor(),
                Person::new(3, Role::Certified).with_team(10),
                Person::new(4, Role::Certified).with_team(20).with_manual_vehicle(1),
                Person::new(5, Role::Organizer).with_manual_vehicle(1),
                Person::new(6, Role::Volunteer),
                Person::new(7, Role::Volunteer).minor(),
            ],
            vec![Team::new(10).with_faction(1), Team::new(20).with_faction(-1)],
            vec![Vehicle::new(1, 10), Vehicle::new(2, 10)],
        )
        .unwrap()
    }

    #[test]
    fn test_team_counters() {
        let mut roster = sample_roster();
        aggregate(&mut roster).unwrap();

        let t10 = roster.teams.get(10).unwrap().stats;
        assert_eq!(t10.new_count, 2);
        assert_eq!(t10.certified_count, 1);
        assert_eq!(t10.minor_count, 1);
        assert_eq!(t10.pinned_count, 0);
        assert_eq!(t10.member_count(), 3);

        let t20 = roster.teams.get(20).unwrap().stats;
        assert_eq!(t20.certified_count, 1);
        assert_eq!(t20.pinned_count, 1);
        assert_eq!(t20.movable_count(), 0);
    }

    #[test]
    fn test_vehicle_manual_counts() {
        let mut roster = sample_roster();
        aggregate(&mut roster).unwrap();
        assert_eq!(roster.vehicles.get(1).unwrap().manual_occupant_count, 2);
        assert_eq!(roster.vehicles.get(2).unwrap().manual_occupant_count, 0);
    }

    #[test]
    fn test_teamless_minor_not_tracked() {
        let mut roster = sample_roster();
        aggregate(&mut roster).unwrap();
        let tracked: u32 = roster.teams.iter().map(|t| t.stats.minor_count).sum();
        assert_eq!(tracked, 1);
        assert_eq!(RosterSummary::from_roster(&roster).minors, 2);
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let mut roster = sample_roster();
        aggregate(&mut roster).unwrap();
        aggregate(&mut roster).unwrap();
        assert_eq!(roster.teams.get(10).unwrap().stats.new_count, 2);
        assert_eq!(roster.vehicles.get(1).unwrap().manual_occupant_count, 2);
    }

    #[test]
    fn test_unknown_team_reference() {
        let mut roster = Roster::from_parts(
            vec![Person::new(1, Role::New).with_team(99)],
            vec![Team::new(1)],
            vec![Vehicle::new(1, 10)],
        )
        .unwrap();

        let err = aggregate(&mut roster).unwrap_err();
        assert!(matches!(
            err,
            ConvoyError::UnknownTeamReference {
                person_id: 1,
                team_id: 99
            }
        ));
    }

    #[test]
    fn test_unknown_vehicle_reference() {
        let mut roster = Roster::from_parts(
            vec![Person::new(1, Role::Certified).with_manual_vehicle(42)],
            vec![],
            vec![Vehicle::new(1, 10)],
        )
        .unwrap();

        let err = aggregate(&mut roster).unwrap_err();
        assert!(matches!(
            err,
            ConvoyError::UnknownVehicleReference {
                person_id: 1,
                vehicle_id: 42
            }
        ));
    }

    #[test]
    fn test_first_dangling_reference_wins() {
        let mut roster = Roster::from_parts(
            vec![
                Person::new(1, Role::New).with_team(1),
                Person::new(2, Role::Certified).with_team(8).with_manual_vehicle(9),
                Person::new(3, Role::New).with_team(7),
            ],
            vec![Team::new(1)],
            vec![Vehicle::new(1, 10)],
        )
        .unwrap();

        let tally = Tally::of(&roster);
        assert_eq!(
            tally.dangling,
            vec![
                DanglingRef::Team {
                    person_id: 2,
                    team_id: 8
                },
                DanglingRef::Vehicle {
                    person_id: 2,
                    vehicle_id: 9
                },
                DanglingRef::Team {
                    person_id: 3,
                    team_id: 7
                },
            ]
        );

        let err = aggregate(&mut roster).unwrap_err();
        assert!(matches!(
            err,
            ConvoyError::UnknownTeamReference {
                person_id: 2,
                team_id: 8
            }
        ));
        assert_eq!(roster.teams.get(1).unwrap().stats, TeamStats::default());
    }

    #[test]
    fn test_tally_tracks_unseated_and_empty_teams() {
        let mut roster = sample_roster();
        roster.add_team(Team::new(30)).unwrap();
        roster.add_person(Person::new(8, Role::New)).unwrap();
        let tally = Tally::of(&roster);

        assert_eq!(tally.unseated, vec![(8, Role::New)]);
        assert!(tally.populated.contains(&10));
        assert!(!tally.populated.contains(&30));
        assert_eq!(tally.pinned_in(1), 2);
        assert_eq!(tally.pinned_in(99), 0);
    }

    #[test]
    fn test_over_capacity() {
        let people = (1..=8).map(|id| Person::new(id, Role::Volunteer).with_manual_vehicle(1));
        let mut roster = Roster::from_parts(people, vec![], vec![Vehicle::new(1, 5)]).unwrap();

        let err = aggregate(&mut roster).unwrap_err();
        assert!(matches!(
            err,
            ConvoyError::OverCapacity {
                vehicle_id: 1,
                pinned: 8,
                capacity: 5
            }
        ));
    }

    #[test]
    fn test_pinned_exactly_at_capacity_is_allowed() {
        let people = (1..=5).map(|id| Person::new(id, Role::Volunteer).with_manual_vehicle(1));
        let mut roster = Roster::from_parts(people, vec![], vec![Vehicle::new(1, 5)]).unwrap();
        assert!(aggregate(&mut roster).is_ok());
    }

    #[test]
    fn test_summary_counts() {
        let roster = sample_roster();
        let summary = RosterSummary::from_roster(&roster);
        assert_eq!(summary.total_seats, 20);
        assert_eq!(summary.people, 7);
        assert_eq!(summary.new, 2);
        assert_eq!(summary.certified, 2);
        assert_eq!(summary.organizers, 1);
        assert_eq!(summary.volunteers, 2);
        assert_eq!(summary.pinned, 2);
        assert_eq!(summary.teams, 2);
        assert_eq!(summary.vehicles, 2);
        assert_eq!(summary.seated, 0);
    }
}
