//! Vehicle model.
//!
//! Vehicles are capacity-bounded bins receiving whole teams plus any
//! manually pinned individuals.

use serde::{Deserialize, Serialize};

use super::{TeamId, VehicleId};

/// A vehicle of the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique vehicle identifier.
    pub id: VehicleId,
    /// Number of seats.
    pub capacity: u32,
    /// People manually pinned to this vehicle (derived).
    pub manual_occupant_count: u32,
    /// Teams placed in this vehicle, in resolution order (output).
    pub assigned_team_ids: Vec<TeamId>,
    /// Manual occupants plus seats consumed by assigned teams (output).
    pub occupied_seats: i64,
}

impl Vehicle {
    /// Creates an empty vehicle.
    pub fn new(id: VehicleId, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            manual_occupant_count: 0,
            assigned_team_ids: Vec::new(),
            occupied_seats: 0,
        }
    }

    /// Seats left for the optimizer after manual pins.
    #[inline]
    pub fn free_seats(&self) -> i64 {
        i64::from(self.capacity) - i64::from(self.manual_occupant_count)
    }

    /// Occupied fraction of capacity (0.0 for a zero-capacity vehicle).
    pub fn fill_rate(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.occupied_seats as f64 / f64::from(self.capacity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_seats() {
        let mut v = Vehicle::new(1, 50);
        v.manual_occupant_count = 8;
        assert_eq!(v.free_seats(), 42);
    }

    #[test]
    fn test_fill_rate() {
        let mut v = Vehicle::new(1, 40);
        v.occupied_seats = 30;
        assert!((v.fill_rate() - 0.75).abs() < 1e-10);
        assert!((Vehicle::new(2, 0).fill_rate() - 0.0).abs() < 1e-10);
    }
}
