//! Allocation domain models.
//!
//! Provides the entity types of an allocation run: people, the teams
//! they belong to, and the vehicles teams are routed to.
//!
//! # Domain Mappings
//!
//! | u-convoy | Event transport | Field trip | Conference shuttle |
//! |----------|-----------------|------------|--------------------|
//! | Person | Participant | Pupil/Staff | Attendee |
//! | Team | Team | Class | Delegation |
//! | Vehicle | Bus | Coach | Shuttle |

mod person;
mod roster;
mod team;
mod vehicle;

pub use person::{Person, Role};
pub use roster::{Collection, EntityMap, Identified, Roster};
pub use team::{Team, TeamStats};
pub use vehicle::Vehicle;

/// Person identifier.
pub type PersonId = u32;
/// Team identifier.
pub type TeamId = u32;
/// Vehicle identifier.
pub type VehicleId = u32;
