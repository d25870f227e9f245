//! Team model.
//!
//! A team is the atomic unit the optimizer places: all of its movable
//! members ride in the same vehicle.

use serde::{Deserialize, Serialize};

use super::{TeamId, VehicleId};

/// Per-team counters derived by the aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    /// Members with the `New` role.
    pub new_count: u32,
    /// Members with the `Certified` role.
    pub certified_count: u32,
    /// Minors belonging to the team (any role).
    pub minor_count: u32,
    /// Team members already pinned to a vehicle (any role).
    pub pinned_count: u32,
}

impl TeamStats {
    /// Seat-occupying members: new + certified.
    #[inline]
    pub fn member_count(&self) -> u32 {
        self.new_count + self.certified_count
    }

    /// Seats the optimizer still has to place for this team.
    ///
    /// Can be negative when pinned staff outnumber seat-occupying members.
    #[inline]
    pub fn movable_count(&self) -> i64 {
        i64::from(self.member_count()) - i64::from(self.pinned_count)
    }
}

/// A team to be routed to exactly one vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Unique team identifier.
    pub id: TeamId,
    /// Team name.
    pub name: String,
    /// Signed balance indicator.
    pub faction: i64,
    /// Derived counters.
    pub stats: TeamStats,
    /// Resolved vehicle (output).
    pub assigned_vehicle_id: Option<VehicleId>,
}

impl Team {
    /// Creates a team with faction 0.
    pub fn new(id: TeamId) -> Self {
        Self {
            id,
            name: String::new(),
            faction: 0,
            stats: TeamStats::default(),
            assigned_vehicle_id: None,
        }
    }

    /// Sets the team name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the faction value.
    pub fn with_faction(mut self, faction: i64) -> Self {
        self.faction = faction;
        self
    }
}
