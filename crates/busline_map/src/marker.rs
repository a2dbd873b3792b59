use busline_core::{GeoPosition, VehicleId};
use fxhash::FxHashMap;

use crate::define_index_newtype;

/// Render state of one vehicle on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub vehicle_id: VehicleId,
    pub label: String,
    pub description: Option<String>,
    pub position: GeoPosition,
    pub selected: bool,
}

type MarkerSlot = Option<Marker>;

define_index_newtype!(MarkerIdx, MarkerSlot);

/// Markers keyed by vehicle. A marker keeps its index for as long as it
/// lives; freed indices are reused for later markers.
#[derive(Debug, Default, Clone)]
pub struct MarkerArena {
    slots: Vec<MarkerSlot>,
    free: Vec<MarkerIdx>,
    by_vehicle: FxHashMap<VehicleId, MarkerIdx>,
}

impl MarkerArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, marker: Marker) -> MarkerIdx {
        if let Some(existing) = self.by_vehicle.get(&marker.vehicle_id).copied() {
            self.slots[existing] = Some(marker);
            return existing;
        }

        let vehicle_id = marker.vehicle_id;
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(marker);
                idx
            }
            None => {
                self.slots.push(Some(marker));
                MarkerIdx::new(self.slots.len() - 1)
            }
        };

        self.by_vehicle.insert(vehicle_id, idx);
        idx
    }

    pub fn remove(&mut self, idx: MarkerIdx) -> Option<Marker> {
        let marker = self.slots.get_mut(idx.get())?.take()?;
        self.by_vehicle.remove(&marker.vehicle_id);
        self.free.push(idx);
        Some(marker)
    }

    pub fn find(&self, vehicle_id: VehicleId) -> Option<MarkerIdx> {
        self.by_vehicle.get(&vehicle_id).copied()
    }

    pub fn get(&self, idx: MarkerIdx) -> Option<&Marker> {
        self.slots.get(idx.get()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, idx: MarkerIdx) -> Option<&mut Marker> {
        self.slots.get_mut(idx.get()).and_then(Option::as_mut)
    }

    pub fn by_vehicle(&self, vehicle_id: VehicleId) -> Option<&Marker> {
        self.find(vehicle_id).and_then(|idx| self.get(idx))
    }

    pub fn len(&self) -> usize {
        self.by_vehicle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_vehicle.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerIdx, &Marker)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|marker| (MarkerIdx::new(index), marker)))
    }

    pub fn positions(&self) -> impl Iterator<Item = GeoPosition> + '_ {
        self.iter().map(|(_, marker)| marker.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(vehicle: u64) -> Marker {
        Marker {
            vehicle_id: VehicleId::new(vehicle),
            label: format!("Bus {vehicle}"),
            description: None,
            position: GeoPosition::new(36.8, 10.1),
            selected: false,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let mut arena = MarkerArena::new();
        let a = arena.insert(marker(1));
        let b = arena.insert(marker(2));

        assert_ne!(a, b);
        assert_eq!(arena.find(VehicleId::new(2)), Some(b));
        assert_eq!(arena.get(a).unwrap().label, "Bus 1");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_reinsert_keeps_index() {
        let mut arena = MarkerArena::new();
        let first = arena.insert(marker(1));

        let mut moved = marker(1);
        moved.position = GeoPosition::new(36.9, 10.2);
        let second = arena.insert(moved);

        assert_eq!(first, second);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(first).unwrap().position, GeoPosition::new(36.9, 10.2));
    }

    #[test]
    fn test_remove_frees_index() {
        let mut arena = MarkerArena::new();
        let a = arena.insert(marker(1));
        arena.insert(marker(2));

        assert_eq!(arena.remove(a).unwrap().vehicle_id, VehicleId::new(1));
        assert!(arena.remove(a).is_none());
        assert!(arena.find(VehicleId::new(1)).is_none());

        let c = arena.insert(marker(3));
        assert_eq!(c, a);

        let vehicles: Vec<u64> = arena.iter().map(|(_, m)| m.vehicle_id.get()).collect();
        assert_eq!(vehicles, vec![3, 2]);
    }
}
