//! Roster diagnostics.
//!
//! The aggregation pass stops at the first fatal problem. This module
//! instead lists every problem it can find, so a roster can be repaired
//! in one go before a real run. Detects:
//! - Dangling team and vehicle references
//! - Vehicles over-filled by manual pins
//! - Teams that no vehicle could ever take (faction, minors, size)
//! - Fleet-wide shortfalls of seats or certified members
//! - Members who will not be seated at all
//!
//! Shortfall checks are necessary conditions only; a roster that passes
//! them may still have no feasible assignment.

use crate::aggregate::{DanglingRef, Tally};
use crate::config::Policy;
use crate::models::{Roster, TeamStats};

/// A validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Finding category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A person references a team that doesn't exist.
    UnknownTeamReference,
    /// A person is pinned to a vehicle that doesn't exist.
    UnknownVehicleReference,
    /// Manual pins alone exceed a vehicle's capacity.
    OverCapacity,
    /// A team's faction lies outside the band on its own.
    FactionOutOfBand,
    /// A team has more minors than any vehicle may carry.
    TooManyMinors,
    /// A team needs more seats than any vehicle has left.
    TeamTooLarge,
    /// Movable members exceed the fleet's free seats.
    SeatShortfall,
    /// Not enough certified members to meet every vehicle's floor.
    CertifiedShortfall,
    /// A new or certified person has no team and no pin (warning).
    UnseatedMember,
    /// A team has no people (warning).
    EmptyTeam,
}

impl ValidationErrorKind {
    /// Whether this finding makes a run fail.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnseatedMember | Self::EmptyTeam)
    }
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = if self.is_fatal() { "error" } else { "warning" };
        write!(f, "{level}: {}", self.message)
    }
}

/// Lists every finding for a roster under the given policy.
///
/// Works on raw collections; derived fields need not be filled.
pub fn validate_roster(roster: &Roster, policy: &Policy) -> Vec<ValidationError> {
    let tally = Tally::of(roster);
    let mut findings = Vec::new();

    for dangling in &tally.dangling {
        findings.push(match *dangling {
            DanglingRef::Team { person_id, team_id } => ValidationError::new(
                ValidationErrorKind::UnknownTeamReference,
                format!("Person {person_id} references unknown team {team_id}"),
            ),
            DanglingRef::Vehicle {
                person_id,
                vehicle_id,
            } => ValidationError::new(
                ValidationErrorKind::UnknownVehicleReference,
                format!("Person {person_id} is pinned to unknown vehicle {vehicle_id}"),
            ),
        });
    }
    for (person_id, role) in &tally.unseated {
        findings.push(ValidationError::new(
            ValidationErrorKind::UnseatedMember,
            format!("Person {person_id} ({role:?}) has no team and no vehicle"),
        ));
    }

    let mut free_seats = Vec::with_capacity(roster.vehicles.len());
    for vehicle in &roster.vehicles {
        let n = tally.pinned_in(vehicle.id);
        if n > vehicle.capacity {
            findings.push(ValidationError::new(
                ValidationErrorKind::OverCapacity,
                format!(
                    "Vehicle {} has {} pinned occupants for {} seats",
                    vehicle.id, n, vehicle.capacity
                ),
            ));
        }
        free_seats.push(i64::from(vehicle.capacity) - i64::from(n));
    }
    let widest = free_seats.iter().copied().max().unwrap_or(0);

    for team in &roster.teams {
        let s = tally.stats_of(team.id);
        if !tally.populated.contains(&team.id) {
            findings.push(ValidationError::new(
                ValidationErrorKind::EmptyTeam,
                format!("Team {} has no people", team.id),
            ));
        }
        if team.faction.abs() > policy.faction_band {
            findings.push(ValidationError::new(
                ValidationErrorKind::FactionOutOfBand,
                format!(
                    "Team {} has faction {} outside [-{band}, {band}]",
                    team.id,
                    team.faction,
                    band = policy.faction_band
                ),
            ));
        }
        if s.minor_count > policy.max_minors_per_vehicle {
            findings.push(ValidationError::new(
                ValidationErrorKind::TooManyMinors,
                format!(
                    "Team {} has {} minors, limit is {}",
                    team.id, s.minor_count, policy.max_minors_per_vehicle
                ),
            ));
        }
        if !free_seats.is_empty() && s.movable_count() > widest {
            findings.push(ValidationError::new(
                ValidationErrorKind::TeamTooLarge,
                format!(
                    "Team {} needs {} seats, largest vehicle has {} free",
                    team.id,
                    s.movable_count(),
                    widest
                ),
            ));
        }
    }

    let demand: i64 = tally.team_stats.values().map(TeamStats::movable_count).sum();
    let supply: i64 = free_seats.iter().sum();
    if demand > supply {
        findings.push(ValidationError::new(
            ValidationErrorKind::SeatShortfall,
            format!("Teams need {demand} seats, fleet has {supply} free"),
        ));
    }

    let certified: u64 = tally
        .team_stats
        .values().map(|s| u64::from(s.certified_count)).sum();
    let required = roster.vehicles.len() as u64 * u64::from(policy.min_certified_per_vehicle);
    if certified < required {
        findings.push(ValidationError::new(
            ValidationErrorKind::CertifiedShortfall,
            format!("{required} certified members needed across the fleet, teams have {certified}"),
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::{Person, Role, Team, Vehicle};

    fn team_of(team_id: u32, first_id: u32, certified: u32, new: u32) -> Vec<Person> {
        let mut people = Vec::new();
        for i in 0..certified {
            people.push(Person::new(first_id + i, Role::Certified).with_team(team_id));
        }
        for i in 0..new {
            people.push(Person::new(first_id + certified + i, Role::New).with_team(team_id));
        }
        people
    }

    fn kinds(findings: &[ValidationError]) -> Vec<ValidationErrorKind> {
        findings.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_valid_roster() {
        let mut people = team_of(1, 1, 2, 3);
        people.extend(team_of(2, 100, 1, 4));
        let roster = Roster::from_parts(
            people,
            vec![Team::new(1).with_faction(1), Team::new(2).with_faction(-1)],
            vec![Vehicle::new(1, 10), Vehicle::new(2, 10)],
        )
        .unwrap();

        assert!(validate_roster(&roster, &Policy::default()).is_empty());
    }

    #[test]
    fn test_reports_all_dangling_references() {
        let roster = Roster::from_parts(
            vec![
                Person::new(1, Role::New).with_team(7),
                Person::new(2, Role::Certified).with_team(8),
                Person::new(3, Role::Organizer).with_manual_vehicle(9),
            ],
            vec![],
            vec![],
        )
        .unwrap();

        let findings = validate_roster(&roster, &Policy::default());
        let k = kinds(&findings);
        assert_eq!(
            k.iter()
                .filter(|&&k| k == ValidationErrorKind::UnknownTeamReference)
                .count(),
            2
        );
        assert!(k.contains(&ValidationErrorKind::UnknownVehicleReference));
    }

    #[test]
    fn test_over_capacity_and_too_large() {
        let mut people: Vec<Person> = (1..=3)
            .map(|id| Person::new(id, Role::Volunteer).with_manual_vehicle(1))
            .collect();
        people.extend(team_of(1, 10, 4, 0));
        let roster =
            Roster::from_parts(people, vec![Team::new(1)], vec![Vehicle::new(1, 2)]).unwrap();

        let findings = validate_roster(&roster, &Policy::default());
        let k = kinds(&findings);
        assert!(k.contains(&ValidationErrorKind::OverCapacity));
        assert!(k.contains(&ValidationErrorKind::TeamTooLarge));
        assert!(k.contains(&ValidationErrorKind::SeatShortfall));
    }

    #[test]
    fn test_faction_and_minor_limits() {
        let people = vec![
            Person::new(1, Role::Certified).with_team(1),
            Person::new(2, Role::New).with_team(1).minor(),
            Person::new(3, Role::New).with_team(1).minor(),
        ];
        let roster = Roster::from_parts(
            people,
            vec![Team::new(1).with_faction(3)],
            vec![Vehicle::new(1, 10)],
        )
        .unwrap();

        let policy = Policy::default().with_max_minors(1);
        let k = kinds(&validate_roster(&roster, &policy));
        assert!(k.contains(&ValidationErrorKind::FactionOutOfBand));
        assert!(k.contains(&ValidationErrorKind::TooManyMinors));
    }

    #[test]
    fn test_certified_shortfall() {
        let roster = Roster::from_parts(
            team_of(1, 1, 1, 2),
            vec![Team::new(1)],
            vec![Vehicle::new(1, 10), Vehicle::new(2, 10)],
        )
        .unwrap();

        let findings = validate_roster(&roster, &Policy::default());
        assert!(findings
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CertifiedShortfall && e.is_fatal()));
    }

    #[test]
    fn test_warnings_are_not_fatal() {
        let mut people = team_of(1, 1, 1, 0);
        people.push(Person::new(50, Role::New));
        let roster = Roster::from_parts(
            people,
            vec![Team::new(1), Team::new(2)],
            vec![Vehicle::new(1, 10)],
        )
        .unwrap();

        let findings = validate_roster(&roster, &Policy::default());
        let k = kinds(&findings);
        assert!(k.contains(&ValidationErrorKind::UnseatedMember));
        assert!(k.contains(&ValidationErrorKind::EmptyTeam));
        assert!(findings.iter().all(|f| !f.is_fatal()));
        assert!(findings.iter().all(|f| f.to_string().starts_with("warning")));
    }

    #[test]
    fn test_counts_match_aggregation() {
        let mut people = team_of(1, 1, 2, 3);
        people[1] = people[1].clone().minor().with_manual_vehicle(2);
        people.push(Person::new(20, Role::Organizer).with_team(1).with_manual_vehicle(2));
        let mut roster = Roster::from_parts(
            people,
            vec![Team::new(1)],
            vec![Vehicle::new(1, 2), Vehicle::new(2, 4)],
        )
        .unwrap();
        aggregate(&mut roster).unwrap();
        let stats = roster.teams.get(1).unwrap().stats;
        let widest = roster.vehicles.iter().map(|v| v.free_seats()).max().unwrap();

        let policy = Policy::default().with_max_minors(0);
        let findings = validate_roster(&roster, &policy);
        let message = |kind| {
            findings
                .iter()
                .find(|f| f.kind == kind)
                .map(|f| f.message.clone())
                .unwrap()
        };
        assert_eq!(
            message(ValidationErrorKind::TooManyMinors),
            format!("Team 1 has {} minors, limit is 0", stats.minor_count)
        );
        assert_eq!(
            message(ValidationErrorKind::TeamTooLarge),
            format!(
                "Team 1 needs {} seats, largest vehicle has {} free",
                stats.movable_count(),
                widest
            )
        );
    }
}
