use std::future::Future;

use busline_core::{RouteId, Station};

use crate::{api_client::ApiClient, error::ProviderError};

/// Read access to the stations of a route, owned by the trip administration.
pub trait RouteDirectory: Send + Sync {
    /// Stations of the route with their order inside it. Coordinates may be missing.
    fn route_stations(
        &self,
        route_id: RouteId,
    ) -> impl Future<Output = Result<Vec<Station>, ProviderError>> + Send;
}

pub struct HttpRouteDirectory {
    api: ApiClient,
}

impl HttpRouteDirectory {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn stations_path(route_id: RouteId) -> String {
        format!("api/trajets/{route_id}/stations")
    }
}

impl RouteDirectory for HttpRouteDirectory {
    async fn route_stations(&self, route_id: RouteId) -> Result<Vec<Station>, ProviderError> {
        let mut stations: Vec<Station> =
            self.api.get_json(&Self::stations_path(route_id)).await?;

        stations.sort_by_key(Station::order);

        tracing::debug!(
            %route_id,
            stations = stations.len(),
            geocoded = stations.iter().filter(|s| s.position().is_some()).count(),
            "Route stations fetched"
        );

        Ok(stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stations_path() {
        assert_eq!(
            HttpRouteDirectory::stations_path(RouteId::new(9)),
            "api/trajets/9/stations"
        );
    }

    #[test]
    fn test_parse_station_list() {
        let json = r#"[
            {"id": 2, "name": "Bab Saadoun", "latitude": 36.81, "longitude": 10.16, "ordre": 1},
            {"id": 1, "name": "Barcelone", "latitude": 36.79, "longitude": 10.18, "ordre": 0, "estimatedMinutes": 12},
            {"id": 3, "name": "Ariana", "ordre": 2}
        ]"#;

        let mut stations: Vec<Station> = serde_json::from_str(json).unwrap();
        stations.sort_by_key(Station::order);

        let names: Vec<_> = stations.iter().map(Station::name).collect();
        assert_eq!(names, vec!["Barcelone", "Bab Saadoun", "Ariana"]);
        assert!(stations[2].position().is_none());
    }
}
