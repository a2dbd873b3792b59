use serde::{Deserialize, Serialize};

use crate::{define_id_newtype, geo_position::GeoPosition};

define_id_newtype!(StationId);
define_id_newtype!(CityId);

/// A station as seen from within one route. The same station can have a
/// different `order` in another route.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    id: StationId,
    name: String,
    #[serde(default)]
    city_id: Option<CityId>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default, alias = "ordre")]
    order: usize,
}

impl Station {
    pub fn new(id: StationId, name: impl Into<String>, order: usize) -> Self {
        Self {
            id,
            name: name.into(),
            city_id: None,
            latitude: None,
            longitude: None,
            order,
        }
    }

    pub fn with_position(mut self, position: GeoPosition) -> Self {
        self.latitude = Some(position.lat);
        self.longitude = Some(position.lng);
        self
    }

    pub fn with_city(mut self, city_id: CityId) -> Self {
        self.city_id = Some(city_id);
        self
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city_id(&self) -> Option<CityId> {
        self.city_id
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Only stations carrying both coordinates can be drawn.
    pub fn position(&self) -> Option<GeoPosition> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPosition::new(lat, lng)),
            _ => None,
        }
    }
}

/// Sorts stations by their order within the route and keeps the geocoded ones.
pub fn geocoded_in_order(stations: &[Station]) -> Vec<(&Station, GeoPosition)> {
    let mut ordered: Vec<&Station> = stations.iter().collect();
    ordered.sort_by_key(|station| station.order());

    ordered
        .into_iter()
        .filter_map(|station| station.position().map(|position| (station, position)))
        .collect()
}
