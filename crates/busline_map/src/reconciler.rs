use busline_core::{GeoPosition, RouteId, Vehicle, VehicleId};
use busline_feed::PositionStore;
use busline_providers::ProviderError;
use fxhash::FxHashMap;
use tracing::{debug, warn};

use crate::{
    marker::{Marker, MarkerArena, MarkerIdx},
    route_overlay::RouteOverlay,
    surface::MarkerSurface,
    utils::bbox::BBox,
};

/// What one reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerDiff {
    pub added: Vec<MarkerIdx>,
    pub updated: Vec<MarkerIdx>,
    pub removed: Vec<MarkerIdx>,
}

impl MarkerDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Issued by [`MarkerReconciler::select`]; a route overlay is only drawn if
/// its ticket still matches the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTicket {
    pub vehicle_id: VehicleId,
    pub route_id: Option<RouteId>,
    epoch: u64,
}

/// Keeps the markers drawn on a [`MarkerSurface`] aligned with the roster,
/// a position store and the current selection.
///
/// Only vehicles of the roster get a marker. A marker is removed when its
/// vehicle leaves the roster; a vehicle that merely stops reporting keeps
/// its marker at the last known position.
pub struct MarkerReconciler<S: MarkerSurface> {
    surface: S,
    roster: FxHashMap<VehicleId, Vehicle>,
    /// Roster order, used to keep passes deterministic.
    roster_order: Vec<VehicleId>,
    markers: MarkerArena,
    selected: Option<VehicleId>,
    selection_epoch: u64,
    last_fit: Option<geo::Rect<f64>>,
}

impl<S: MarkerSurface> MarkerReconciler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            roster: FxHashMap::default(),
            roster_order: Vec::new(),
            markers: MarkerArena::new(),
            selected: None,
            selection_epoch: 0,
            last_fit: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn markers(&self) -> &MarkerArena {
        &self.markers
    }

    pub fn marker(&self, vehicle_id: VehicleId) -> Option<&Marker> {
        self.markers.by_vehicle(vehicle_id)
    }

    pub fn selected(&self) -> Option<VehicleId> {
        self.selected
    }

    pub fn known_positions(&self) -> Vec<(VehicleId, GeoPosition)> {
        self.markers
            .iter()
            .map(|(_, marker)| (marker.vehicle_id, marker.position))
            .collect()
    }

    /// Replaces the roster. Markers of vehicles that left it go away on
    /// the next [`Self::reconcile`].
    pub fn set_roster(&mut self, vehicles: Vec<Vehicle>) {
        self.roster_order = vehicles.iter().map(Vehicle::id).collect();
        self.roster = vehicles
            .into_iter()
            .map(|vehicle| (vehicle.id(), vehicle))
            .collect();
    }

    /// Diffs the markers against `store` and pushes only the differences to
    /// the surface.
    pub fn reconcile(&mut self, store: &PositionStore) -> MarkerDiff {
        let mut diff = MarkerDiff::default();

        let departed: Vec<MarkerIdx> = self
            .markers
            .iter()
            .filter(|(_, marker)| !self.roster.contains_key(&marker.vehicle_id))
            .map(|(idx, _)| idx)
            .collect();

        for idx in departed {
            if let Some(marker) = self.markers.remove(idx) {
                debug!(vehicle_id = %marker.vehicle_id, "Vehicle left the roster");
                if self.selected == Some(marker.vehicle_id) {
                    self.drop_selection();
                }
                diff.removed.push(idx);
            }
        }

        for vehicle_id in &self.roster_order {
            let Some(vehicle) = self.roster.get(vehicle_id) else {
                continue;
            };
            let Some(update) = store.get(*vehicle_id) else {
                continue;
            };

            let wanted = Marker {
                vehicle_id: *vehicle_id,
                label: vehicle.label().to_string(),
                description: update
                    .description
                    .clone()
                    .or_else(|| vehicle.description().map(str::to_string)),
                position: update.position,
                selected: self.selected == Some(*vehicle_id),
            };

            match self.markers.find(*vehicle_id) {
                None => diff.added.push(self.markers.insert(wanted)),
                Some(idx) => {
                    if let Some(current) = self.markers.get_mut(idx) {
                        if *current != wanted {
                            *current = wanted;
                            diff.updated.push(idx);
                        }
                    }
                }
            }
        }

        self.apply(&diff);
        self.follow_new_selection(&diff);
        self.auto_fit();

        diff
    }

    /// Selects `vehicle_id`, deselecting the previous vehicle in the same
    /// step, and centers the view on it.
    ///
    /// Returns `None` when the vehicle is not part of the roster.
    pub fn select(&mut self, vehicle_id: VehicleId) -> Option<SelectionTicket> {
        let route_id = self.roster.get(&vehicle_id)?.route_id();

        let previous = self.selected.replace(vehicle_id);
        self.selection_epoch += 1;

        if let Some(previous) = previous.filter(|previous| *previous != vehicle_id) {
            self.set_marker_selected(previous, false);
        }
        self.set_marker_selected(vehicle_id, true);

        if let Some(position) = self.marker(vehicle_id).map(|marker| marker.position) {
            self.surface.fly_to(position);
        }
        self.surface.clear_route();

        Some(SelectionTicket {
            vehicle_id,
            route_id,
            epoch: self.selection_epoch,
        })
    }

    /// Clears the selection and its route, and fits the view again.
    pub fn clear_selection(&mut self) {
        if self.selected.is_none() {
            return;
        }

        self.drop_selection();
        self.auto_fit();
    }

    /// Draws the route resolved for `ticket`. Returns false when the
    /// selection changed in the meantime, in which case nothing is drawn.
    pub fn apply_route_overlay(
        &mut self,
        ticket: SelectionTicket,
        overlay: Result<Option<RouteOverlay>, ProviderError>,
    ) -> bool {
        if ticket.epoch != self.selection_epoch || self.selected != Some(ticket.vehicle_id) {
            debug!(vehicle_id = %ticket.vehicle_id, "Discarding stale route overlay");
            return false;
        }

        match overlay {
            Ok(Some(overlay)) => self.surface.draw_route(&overlay),
            Ok(None) => {
                debug!(vehicle_id = %ticket.vehicle_id, "Route has no geocoded station");
                self.surface.clear_route();
            }
            Err(error) => {
                warn!(
                    vehicle_id = %ticket.vehicle_id,
                    error = %error,
                    "Could not load route overlay"
                );
                self.surface.clear_route();
            }
        }

        true
    }

    fn apply(&mut self, diff: &MarkerDiff) {
        for idx in &diff.removed {
            self.surface.remove_marker(*idx);
        }

        for idx in &diff.added {
            if let Some(marker) = self.markers.get(*idx) {
                self.surface.create_marker(*idx, marker);
            }
        }

        for idx in &diff.updated {
            if let Some(marker) = self.markers.get(*idx) {
                self.surface.update_marker(*idx, marker);
            }
        }
    }

    /// A vehicle selected before it had a position gets the view once its
    /// marker shows up.
    fn follow_new_selection(&mut self, diff: &MarkerDiff) {
        let Some(selected) = self.selected else {
            return;
        };

        let position = diff
            .added
            .iter()
            .filter_map(|idx| self.markers.get(*idx))
            .find(|marker| marker.vehicle_id == selected)
            .map(|marker| marker.position);

        if let Some(position) = position {
            self.surface.fly_to(position);
        }
    }

    fn auto_fit(&mut self) {
        if self.selected.is_some() {
            return;
        }

        let bounds = self.markers.positions().collect::<BBox>().to_rect();
        if let Some(rect) = bounds.filter(|rect| self.last_fit != Some(*rect)) {
            self.surface.fit_bounds(rect);
            self.last_fit = Some(rect);
        }
    }

    /// Auto-fit resumes from scratch afterwards.
    fn drop_selection(&mut self) {
        if let Some(previous) = self.selected.take() {
            self.selection_epoch += 1;
            self.last_fit = None;
            self.set_marker_selected(previous, false);
            self.surface.clear_route();
        }
    }

    fn set_marker_selected(&mut self, vehicle_id: VehicleId, selected: bool) {
        let Some(idx) = self.markers.find(vehicle_id) else {
            return;
        };

        if let Some(marker) = self.markers.get_mut(idx) {
            if marker.selected != selected {
                marker.selected = selected;
                self.surface.update_marker(idx, marker);
            }
        }
    }
}
