use serde::{Deserialize, Serialize};

use crate::{geo_position::GeoPosition, vehicle::VehicleId};

/// Monotonic sequence number assigned when an update is accepted from the feed.
///
/// Only comparable within a single connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ArrivalOrder(u64);

impl ArrivalOrder {
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }

    pub const fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A single position sample for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub vehicle_id: VehicleId,
    pub position: GeoPosition,
    pub description: Option<String>,
    pub arrival_order: ArrivalOrder,
}

impl PositionUpdate {
    pub fn new(vehicle_id: VehicleId, position: GeoPosition) -> Self {
        Self {
            vehicle_id,
            position,
            description: None,
            arrival_order: ArrivalOrder::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_arrival_order(mut self, arrival_order: ArrivalOrder) -> Self {
        self.arrival_order = arrival_order;
        self
    }

    pub fn latitude(&self) -> f64 {
        self.position.lat
    }

    pub fn longitude(&self) -> f64 {
        self.position.lng
    }
}
