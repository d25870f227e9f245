//! Person (participant) model.
//!
//! A person belongs to at most one team and carries exactly one role.
//! A manual vehicle pin overrides whatever the optimizer decides for the
//! person's team.

use serde::{Deserialize, Serialize};

use super::{PersonId, TeamId, VehicleId};

/// Role of a participant.
///
/// Roles are mutually exclusive. Only `New` and `Certified` members count
/// towards a team's seat demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// First-time participant.
    New,
    /// Certified member (chaperone-equivalent).
    Certified,
    /// Event organizer.
    Organizer,
    /// Volunteer staff.
    Volunteer,
}

impl Role {
    /// Resolves a role from the four independent input flags.
    ///
    /// When several flags are set the first in `new > certified >
    /// organizer > volunteer` order wins. Returns `None` if no flag is set.
    pub fn from_flags(new: bool, certified: bool, organizer: bool, volunteer: bool) -> Option<Self> {
        if new {
            Some(Self::New)
        } else if certified {
            Some(Self::Certified)
        } else if organizer {
            Some(Self::Organizer)
        } else if volunteer {
            Some(Self::Volunteer)
        } else {
            None
        }
    }

    /// Whether this role occupies a seat in the team's demand.
    #[inline]
    pub fn is_member(&self) -> bool {
        matches!(self, Self::New | Self::Certified)
    }

    #[inline]
    pub fn is_new(&self) -> bool {
        *self == Self::New
    }

    #[inline]
    pub fn is_certified(&self) -> bool {
        *self == Self::Certified
    }

    #[inline]
    pub fn is_organizer(&self) -> bool {
        *self == Self::Organizer
    }

    #[inline]
    pub fn is_volunteer(&self) -> bool {
        *self == Self::Volunteer
    }
}

/// A participant to be seated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    /// Unique person identifier.
    pub id: PersonId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact e-mail.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Participant role.
    pub role: Role,
    /// Whether the person is an adult.
    pub is_adult: bool,
    /// Team membership. `None` for staff without a team.
    pub team_id: Option<TeamId>,
    /// Pre-decided vehicle, overriding the optimizer.
    pub manual_vehicle_id: Option<VehicleId>,
    /// Resolved vehicle (output). Stays `None` for teamless, unpinned people.
    pub assigned_vehicle_id: Option<VehicleId>,
}

impl Person {
    /// Creates an adult person with the given role and no team.
    pub fn new(id: PersonId, role: Role) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            role,
            is_adult: true,
            team_id: None,
            manual_vehicle_id: None,
            assigned_vehicle_id: None,
        }
    }

    /// Sets first and last name.
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// Sets e-mail and phone.
    pub fn with_contact(mut self, email: impl Into<String>, phone: impl Into<String>) -> Self {
        self.email = email.into();
        self.phone = phone.into();
        self
    }

    /// Places the person in a team.
    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Marks the person as a minor.
    pub fn minor(mut self) -> Self {
        self.is_adult = false;
        self
    }

    /// Pins the person to a vehicle.
    pub fn with_manual_vehicle(mut self, vehicle_id: VehicleId) -> Self {
        self.manual_vehicle_id = Some(vehicle_id);
        self
    }

    /// Whether the person is manually pinned to a vehicle.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.manual_vehicle_id.is_some()
    }
}
