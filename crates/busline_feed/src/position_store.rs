use std::sync::Arc;

use busline_core::{GeoPosition, PositionUpdate, VehicleId};
use busline_providers::DurableLocationStore;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::listener_registry::PositionListener;

/// Latest applied update per vehicle. Applying always overwrites, so the
/// entry is the last update in arrival order, whatever it carries.
#[derive(Debug, Clone, Default)]
pub struct PositionStore {
    entries: FxHashMap<VehicleId, PositionUpdate>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replaced entry, if any.
    pub fn apply(&mut self, update: PositionUpdate) -> Option<PositionUpdate> {
        self.entries.insert(update.vehicle_id, update)
    }

    /// Inserts a durable fallback position, unless a live update already
    /// arrived for this vehicle.
    pub fn seed(&mut self, vehicle_id: VehicleId, position: GeoPosition) -> bool {
        if self.entries.contains_key(&vehicle_id) {
            return false;
        }

        self.entries
            .insert(vehicle_id, PositionUpdate::new(vehicle_id, position));
        true
    }

    pub fn get(&self, vehicle_id: VehicleId) -> Option<&PositionUpdate> {
        self.entries.get(&vehicle_id)
    }

    pub fn position(&self, vehicle_id: VehicleId) -> Option<GeoPosition> {
        self.entries.get(&vehicle_id).map(|update| update.position)
    }

    pub fn remove(&mut self, vehicle_id: VehicleId) -> Option<PositionUpdate> {
        self.entries.remove(&vehicle_id)
    }

    pub fn contains(&self, vehicle_id: VehicleId) -> bool {
        self.entries.contains_key(&vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionUpdate> {
        self.entries.values()
    }

    pub fn positions(&self) -> impl Iterator<Item = (VehicleId, GeoPosition)> + '_ {
        self.entries
            .iter()
            .map(|(vehicle_id, update)| (*vehicle_id, update.position))
    }
}

/// A position store owned by one observer, fed from a listener and read by
/// whoever renders it. Every change bumps a version on a watch channel.
#[derive(Clone)]
pub struct SharedPositionStore {
    store: Arc<Mutex<PositionStore>>,
    version: Arc<watch::Sender<u64>>,
}

impl Default for SharedPositionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedPositionStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            store: Arc::new(Mutex::new(PositionStore::new())),
            version: Arc::new(version),
        }
    }

    pub fn apply(&self, update: PositionUpdate) {
        self.store.lock().apply(update);
        self.bump();
    }

    pub fn seed(&self, vehicle_id: VehicleId, position: GeoPosition) -> bool {
        let seeded = self.store.lock().seed(vehicle_id, position);
        if seeded {
            self.bump();
        }
        seeded
    }

    pub fn snapshot(&self) -> PositionStore {
        self.store.lock().clone()
    }

    pub fn with<R>(&self, read: impl FnOnce(&PositionStore) -> R) -> R {
        read(&self.store.lock())
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Resolves on every subsequent change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Listener folding every published update into this store.
    pub fn listener(&self) -> impl PositionListener + 'static {
        let store = self.clone();
        move |update: &PositionUpdate| -> anyhow::Result<()> {
            store.apply(update.clone());
            Ok(())
        }
    }

    fn bump(&self) {
        self.version.send_modify(|version| *version += 1);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub seeded: usize,
    /// Already had a live position when the durable one came back.
    pub superseded: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Cold start: fetches the last durable position of every vehicle and seeds
/// the store with it.
///
/// Lookup failures and vehicles without history both leave the store
/// untouched, but they are logged and counted separately.
pub async fn seed_from_durable<S>(
    store: &SharedPositionStore,
    durable: &S,
    vehicles: &[VehicleId],
) -> SeedReport
where
    S: DurableLocationStore,
{
    let lookups = vehicles.iter().map(|&vehicle_id| async move {
        (vehicle_id, durable.fetch_latest(vehicle_id).await)
    });

    let results = futures::future::join_all(lookups).await;

    let mut report = SeedReport::default();
    for (vehicle_id, result) in results {
        match result {
            Ok(Some(latest)) => {
                if store.seed(vehicle_id, latest.position()) {
                    report.seeded += 1;
                } else {
                    report.superseded += 1;
                }
            }
            Ok(None) => {
                debug!(%vehicle_id, "No durable position recorded yet");
                report.not_found += 1;
            }
            Err(error) => {
                warn!(%vehicle_id, error = %error, "Durable position lookup failed");
                report.failed += 1;
            }
        }
    }

    debug!(
        seeded = report.seeded,
        superseded = report.superseded,
        not_found = report.not_found,
        failed = report.failed,
        "Position store seeded"
    );

    report
}
