//! Roster: the three entity collections of a run.
//!
//! Each collection maps an integer id to its entity while keeping load
//! order, which drives every enumeration downstream (model variables,
//! resolution order, manifest numbering).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Person, Team, Vehicle};
use crate::error::{ConvoyError, Result};

/// Which input collection an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    People,
    Teams,
    Vehicles,
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::People => "people",
            Self::Teams => "teams",
            Self::Vehicles => "vehicles",
        })
    }
}

/// An entity addressable by a numeric id.
pub trait Identified {
    const COLLECTION: Collection;

    fn id(&self) -> u32;
}

impl Identified for Person {
    const COLLECTION: Collection = Collection::People;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for Team {
    const COLLECTION: Collection = Collection::Teams;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for Vehicle {
    const COLLECTION: Collection = Collection::Vehicles;

    fn id(&self) -> u32 {
        self.id
    }
}

/// Insertion-ordered id → entity map that rejects duplicate ids.
#[derive(Debug, Clone)]
pub struct EntityMap<T> {
    items: Vec<T>,
    index: HashMap<u32, usize>,
}

impl<T> Default for EntityMap<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Identified> EntityMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity, failing with `DuplicateId` if its id is taken.
    pub fn insert(&mut self, item: T) -> Result<()> {
        let id = item.id();
        if self.index.contains_key(&id) {
            return Err(ConvoyError::DuplicateId {
                collection: T::COLLECTION,
                id,
            });
        }
        self.index.insert(id, self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.index.get(&id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.index.get(&id).map(|&i| &mut self.items[i])
    }

    /// Ids in load order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.items.iter().map(Identified::id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a EntityMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// People, teams, and vehicles of one batch run.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub people: EntityMap<Person>,
    pub teams: EntityMap<Team>,
    pub vehicles: EntityMap<Vehicle>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a roster from three independent collections.
    ///
    /// Fails on the first id collision within a collection.
    pub fn from_parts(
        people: impl IntoIterator<Item = Person>,
        teams: impl IntoIterator<Item = Team>,
        vehicles: impl IntoIterator<Item = Vehicle>,
    ) -> Result<Self> {
        let mut roster = Self::new();
        for person in people {
            roster.add_person(person)?;
        }
        for team in teams {
            roster.add_team(team)?;
        }
        for vehicle in vehicles {
            roster.add_vehicle(vehicle)?;
        }
        Ok(roster)
    }

    pub fn add_person(&mut self, person: Person) -> Result<()> {
        self.people.insert(person)
    }

    pub fn add_team(&mut self, team: Team) -> Result<()> {
        self.teams.insert(team)
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> Result<()> {
        self.vehicles.insert(vehicle)
    }

    /// Total seats across the fleet.
    pub fn total_capacity(&self) -> u64 {
        self.vehicles.iter().map(|v| u64::from(v.capacity)).sum()
    }

    /// People resolved to a vehicle, in load order.
    pub fn occupants_of(&self, vehicle_id: u32) -> impl Iterator<Item = &Person> + '_ {
        self.people
            .iter()
            .filter(move |p| p.assigned_vehicle_id == Some(vehicle_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_insertion_order_preserved() {
        let mut map = EntityMap::new();
        for id in [5, 1, 3] {
            map.insert(Team::new(id)).unwrap();
        }
        assert_eq!(map.ids().collect::<Vec<_>>(), vec![5, 1, 3]);
        assert_eq!(map.get(1).map(|t| t.id), Some(1));
        assert!(map.get(2).is_none());
    }

    #[test]
    fn test_duplicate_id_names_collection() {
        let mut roster = Roster::new();
        roster.add_vehicle(Vehicle::new(1, 10)).unwrap();
        let err = roster.add_vehicle(Vehicle::new(1, 20)).unwrap_err();
        assert_eq!(roster.vehicles.get(1).map(|v| v.capacity), Some(10));

        match err {
            ConvoyError::DuplicateId { collection, id } => {
                assert_eq!(collection, Collection::Vehicles);
                assert_eq!(id, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_id_in_different_collections() {
        let roster = Roster::from_parts(
            vec![Person::new(1, Role::Organizer)],
            vec![Team::new(1)],
            vec![Vehicle::new(1, 10)],
        );
        assert!(roster.is_ok());
    }

    #[test]
    fn test_total_capacity() {
        let roster =
            Roster::from_parts(vec![], vec![], vec![Vehicle::new(1, 50), Vehicle::new(2, 30)])
                .unwrap();
        assert_eq!(roster.total_capacity(), 80);
    }
}
