use geo::{Distance, Haversine, InterpolatePoint};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate as exchanged with the feed and the admin API.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPosition {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance in meters.
    pub fn haversine_distance(&self, other: &GeoPosition) -> f64 {
        Haversine.distance(geo::Point::from(*self), geo::Point::from(*other))
    }

    /// Point at `fraction` of the great-circle path to `to`, clamped to the
    /// two ends.
    pub fn point_at_ratio(&self, to: &GeoPosition, fraction: f64) -> GeoPosition {
        if fraction <= 0.0 {
            return *self;
        }
        if fraction >= 1.0 {
            return *to;
        }

        let point =
            Haversine.point_at_ratio_between(geo::Point::from(*self), geo::Point::from(*to), fraction);
        GeoPosition::from(point.0)
    }
}

impl From<GeoPosition> for geo_types::Coord<f64> {
    fn from(position: GeoPosition) -> Self {
        geo_types::Coord {
            x: position.lng,
            y: position.lat,
        }
    }
}

impl From<&GeoPosition> for geo_types::Coord<f64> {
    fn from(position: &GeoPosition) -> Self {
        (*position).into()
    }
}

impl From<GeoPosition> for geo_types::Point<f64> {
    fn from(position: GeoPosition) -> Self {
        geo_types::Point::new(position.lng, position.lat)
    }
}

impl From<geo_types::Coord<f64>> for GeoPosition {
    fn from(coord: geo_types::Coord<f64>) -> Self {
        GeoPosition {
            lat: coord.y,
            lng: coord.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        let brussels = GeoPosition::new(50.8467, 4.3525);
        let antwerp = GeoPosition::new(51.2194, 4.4025);

        let distance = brussels.haversine_distance(&antwerp);
        assert!((distance - 41_700.0).abs() < 500.0, "{distance}");
        assert_eq!(brussels.haversine_distance(&brussels), 0.0);
    }

    #[test]
    fn test_coord_uses_lng_as_x() {
        let coord: geo_types::Coord = GeoPosition::new(36.8, 10.18).into();
        assert_eq!(coord.x, 10.18);
        assert_eq!(coord.y, 36.8);
    }

    #[test]
    fn test_is_valid() {
        assert!(GeoPosition::new(36.8, 10.18).is_valid());
        assert!(!GeoPosition::new(91.0, 0.0).is_valid());
        assert!(!GeoPosition::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_point_at_ratio() {
        let a = GeoPosition::new(0.0, 0.0);
        let b = GeoPosition::new(0.0, 20.0);

        let middle = a.point_at_ratio(&b, 0.5);
        assert!(middle.lat.abs() < 1e-9, "{middle:?}");
        assert!((middle.lng - 10.0).abs() < 1e-9, "{middle:?}");

        assert_eq!(a.point_at_ratio(&b, 2.0), b);
        assert_eq!(a.point_at_ratio(&b, -1.0), a);
    }
}
