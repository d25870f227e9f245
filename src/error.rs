//! Error taxonomy.
//!
//! Every error is fatal: a run either produces a complete, consistent
//! export or none at all. Variants fall into three groups:
//!
//! - **Validation** (raised before any solver work): duplicate ids,
//!   dangling references, missing roles, over-full manual baselines.
//! - **Solver outcome** (raised right after the solver call):
//!   infeasibility, solver failure, broken single-assignment invariant.
//! - **Ambient**: configuration, file and record parsing failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::{Collection, PersonId, TeamId, VehicleId};

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ConvoyError>;

#[derive(Debug, Error)]
pub enum ConvoyError {
    #[error("Duplicate id {id} in {collection}")]
    DuplicateId { collection: Collection, id: u32 },

    #[error("Person {person_id} references unknown team {team_id}")]
    UnknownTeamReference { person_id: PersonId, team_id: TeamId },

    #[error("Person {person_id} is pinned to unknown vehicle {vehicle_id}")]
    UnknownVehicleReference {
        person_id: PersonId,
        vehicle_id: VehicleId,
    },

    #[error("Person {person_id} has no role (new, certified, organizer or volunteer)")]
    UnassignedRole { person_id: PersonId },

    #[error("Vehicle {vehicle_id} has more pinned occupants than seats: {pinned} > {capacity}")]
    OverCapacity {
        vehicle_id: VehicleId,
        pinned: u32,
        capacity: u32,
    },

    #[error("No feasible assignment exists ({solver})")]
    NoFeasibleAssignment { solver: String },

    #[error("Team {team_id} resolved to {} vehicles {vehicles:?}, expected exactly one", vehicles.len())]
    ResolverInvariant {
        team_id: TeamId,
        vehicles: Vec<VehicleId>,
    },

    #[error("Resolved plan failed audit: {0}")]
    AuditFailed(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Invalid {collection} record at row {row}: {message}")]
    InvalidRecord {
        collection: Collection,
        row: usize,
        message: String,
    },

    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvoyError {
    /// Input-data problems detected before solving.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId { .. }
                | Self::UnknownTeamReference { .. }
                | Self::UnknownVehicleReference { .. }
                | Self::UnassignedRole { .. }
                | Self::OverCapacity { .. }
        )
    }

    /// Outcomes of the solver call or of decoding its answer.
    pub fn is_solver_outcome(&self) -> bool {
        matches!(
            self,
            Self::NoFeasibleAssignment { .. }
                | Self::ResolverInvariant { .. }
                | Self::AuditFailed(_)
                | Self::Solver(_)
        )
    }
}
