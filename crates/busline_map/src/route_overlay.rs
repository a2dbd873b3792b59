use busline_core::{GeoPosition, RouteId, Station, StationId, station::geocoded_in_order};
use busline_providers::{ProviderError, RouteDirectory};

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStation {
    pub id: StationId,
    pub name: String,
    pub position: GeoPosition,
}

/// Polyline through the geocoded stations of a route, in route order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub route_id: RouteId,
    pub path: geo::LineString<f64>,
    pub stations: Vec<OverlayStation>,
}

impl RouteOverlay {
    /// `None` when no station of the route carries coordinates.
    pub fn from_stations(route_id: RouteId, stations: &[Station]) -> Option<Self> {
        let geocoded = geocoded_in_order(stations);
        if geocoded.is_empty() {
            return None;
        }

        let stations: Vec<OverlayStation> = geocoded
            .into_iter()
            .map(|(station, position)| OverlayStation {
                id: station.id(),
                name: station.name().to_string(),
                position,
            })
            .collect();

        let path = geo::LineString::from(
            stations
                .iter()
                .map(|station| geo::Coord::from(station.position))
                .collect::<Vec<_>>(),
        );

        Some(Self {
            route_id,
            path,
            stations,
        })
    }

    /// Straight-line length through the stations, in meters.
    pub fn length_meters(&self) -> f64 {
        self.stations
            .windows(2)
            .map(|pair| pair[0].position.haversine_distance(&pair[1].position))
            .sum()
    }
}

/// Fetches the stations of `route_id` and builds its overlay.
pub async fn load_route_overlay<D>(
    directory: &D,
    route_id: RouteId,
) -> Result<Option<RouteOverlay>, ProviderError>
where
    D: RouteDirectory,
{
    let stations = directory.route_stations(route_id).await?;
    Ok(RouteOverlay::from_stations(route_id, &stations))
}
