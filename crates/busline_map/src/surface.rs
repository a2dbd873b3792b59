use busline_core::GeoPosition;
use tracing::info;

use crate::{
    marker::{Marker, MarkerIdx},
    route_overlay::RouteOverlay,
};

/// Whatever draws the map. Calls only ever describe a change; the
/// reconciler never asks the surface for its state.
pub trait MarkerSurface {
    fn create_marker(&mut self, idx: MarkerIdx, marker: &Marker);

    fn update_marker(&mut self, idx: MarkerIdx, marker: &Marker);

    fn remove_marker(&mut self, idx: MarkerIdx);

    fn fit_bounds(&mut self, bounds: geo::Rect<f64>);

    fn fly_to(&mut self, position: GeoPosition);

    fn draw_route(&mut self, overlay: &RouteOverlay);

    fn clear_route(&mut self);
}

/// Surface that renders to the log, for headless runs.
#[derive(Debug, Default)]
pub struct LoggingSurface;

impl MarkerSurface for LoggingSurface {
    fn create_marker(&mut self, idx: MarkerIdx, marker: &Marker) {
        info!(
            %idx,
            vehicle_id = %marker.vehicle_id,
            label = %marker.label,
            lat = marker.position.lat,
            lng = marker.position.lng,
            "Marker added"
        );
    }

    fn update_marker(&mut self, idx: MarkerIdx, marker: &Marker) {
        info!(
            %idx,
            vehicle_id = %marker.vehicle_id,
            lat = marker.position.lat,
            lng = marker.position.lng,
            selected = marker.selected,
            "Marker moved"
        );
    }

    fn remove_marker(&mut self, idx: MarkerIdx) {
        info!(%idx, "Marker removed");
    }

    fn fit_bounds(&mut self, bounds: geo::Rect<f64>) {
        info!(
            south = bounds.min().y,
            west = bounds.min().x,
            north = bounds.max().y,
            east = bounds.max().x,
            "Fit view"
        );
    }

    fn fly_to(&mut self, position: GeoPosition) {
        info!(lat = position.lat, lng = position.lng, "Center view");
    }

    fn draw_route(&mut self, overlay: &RouteOverlay) {
        let names: Vec<&str> = overlay.stations.iter().map(|s| s.name.as_str()).collect();
        info!(
            route_id = %overlay.route_id,
            stations = ?names,
            "Route drawn"
        );
    }

    fn clear_route(&mut self) {
        info!("Route cleared");
    }
}
