use serde::{Deserialize, Serialize};

use crate::{define_id_newtype, route::RouteId};

define_id_newtype!(VehicleId);

/// A tracked bus as listed by the fleet administration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    id: VehicleId,
    #[serde(alias = "name")]
    label: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "trajetId")]
    route_id: Option<RouteId>,
}

impl Vehicle {
    pub fn new(id: VehicleId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            description: None,
            route_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_route(mut self, route_id: RouteId) -> Self {
        self.route_id = Some(route_id);
        self
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn route_id(&self) -> Option<RouteId> {
        self.route_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_admin_payload() {
        let json = r#"{"id": 7, "name": "Bus 7", "description": "Line 12", "trajetId": 3}"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();

        assert_eq!(vehicle.id(), VehicleId::new(7));
        assert_eq!(vehicle.label(), "Bus 7");
        assert_eq!(vehicle.description(), Some("Line 12"));
        assert_eq!(vehicle.route_id(), Some(RouteId::new(3)));
    }

    #[test]
    fn test_deserialize_without_route() {
        let json = r#"{"id": 1, "label": "Spare"}"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();

        assert_eq!(vehicle.route_id(), None);
        assert_eq!(vehicle.description(), None);
    }
}
