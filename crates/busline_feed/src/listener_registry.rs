use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Weak},
};

use busline_core::{ArrivalOrder, PositionUpdate};
use parking_lot::Mutex;
use tracing::{trace, warn};

/// Whatever a listener fails with. Only ever logged.
pub type ListenerError = anyhow::Error;

/// Receives every position update published after it subscribed.
///
/// A listener that returns an error or panics is logged and skipped; it
/// stays registered and the other listeners still get the update.
pub trait PositionListener: Send + Sync {
    fn on_position(&self, update: &PositionUpdate) -> Result<(), ListenerError>;
}

impl<F> PositionListener for F
where
    F: Fn(&PositionUpdate) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_position(&self, update: &PositionUpdate) -> Result<(), ListenerError> {
        self(update)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Publish/subscribe seam between the feed and its observers.
pub trait PositionFeed: Send + Sync {
    fn subscribe<L>(&self, listener: L) -> SubscriptionToken
    where
        L: PositionListener + 'static;

    /// Returns false when the token was not (or no longer) registered.
    fn unsubscribe(&self, token: SubscriptionToken) -> bool;

    /// Delivers `update` to every current listener, in registration order.
    /// Returns how many listeners accepted it.
    fn publish(&self, update: PositionUpdate) -> usize;
}

#[derive(Default)]
struct RegistryState {
    listeners: Vec<(SubscriptionToken, Arc<dyn PositionListener>)>,
    next_token: u64,
    last_arrival: ArrivalOrder,
    /// Bumped by every clear.
    epoch: u64,
}

/// In-memory fan-out of position updates.
///
/// Cloning yields another handle on the same set of listeners.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every listener and starts a new epoch. Arrival order keeps
    /// counting.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let removed = state.listeners.len();
        state.listeners.clear();
        state.epoch += 1;
        trace!(removed, epoch = state.epoch, "Listener registry cleared");
    }

    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Publishes `update` only if the registry was not cleared since `epoch`.
    /// Returns `None` when the update was dropped as stale.
    pub fn publish_in_epoch(&self, epoch: u64, update: PositionUpdate) -> Option<usize> {
        self.deliver(Some(epoch), update)
    }

    fn deliver(&self, epoch: Option<u64>, mut update: PositionUpdate) -> Option<usize> {
        // Snapshot under the lock, deliver outside of it so listeners may
        // subscribe or unsubscribe from their callback.
        let listeners = {
            let mut state = self.state.lock();
            if epoch.is_some_and(|epoch| epoch != state.epoch) {
                trace!(vehicle_id = %update.vehicle_id, "Dropping update from a previous epoch");
                return None;
            }
            state.last_arrival = state.last_arrival.next();
            update.arrival_order = state.last_arrival;
            state.listeners.clone()
        };

        let mut delivered = 0;
        for (token, listener) in &listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_position(&update))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(error)) => warn!(
                    listener = token.get(),
                    vehicle_id = %update.vehicle_id,
                    error = %error,
                    "Position listener failed"
                ),
                Err(_) => warn!(
                    listener = token.get(),
                    vehicle_id = %update.vehicle_id,
                    "Position listener panicked"
                ),
            }
        }

        trace!(
            vehicle_id = %update.vehicle_id,
            arrival = update.arrival_order.get(),
            delivered,
            listeners = listeners.len(),
            "Position update published"
        );

        Some(delivered)
    }

    /// Handle that can unsubscribe `token` without keeping the registry alive.
    pub fn subscription(&self, token: SubscriptionToken) -> Subscription {
        Subscription {
            token,
            registry: Arc::downgrade(&self.state),
        }
    }
}

impl PositionFeed for ListenerRegistry {
    fn subscribe<L>(&self, listener: L) -> SubscriptionToken
    where
        L: PositionListener + 'static,
    {
        let mut state = self.state.lock();
        let token = SubscriptionToken(state.next_token);
        state.next_token += 1;
        state.listeners.push((token, Arc::new(listener)));
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut state = self.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(t, _)| *t != token);
        before != state.listeners.len()
    }

    fn publish(&self, update: PositionUpdate) -> usize {
        self.deliver(None, update).unwrap_or_default()
    }
}

/// Returned when adding a listener; call [`Subscription::unsubscribe`] to stop
/// receiving updates. Dropping it keeps the listener registered.
#[derive(Debug, Clone)]
pub struct Subscription {
    token: SubscriptionToken,
    registry: Weak<Mutex<RegistryState>>,
}

impl Subscription {
    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(state) => ListenerRegistry { state }.unsubscribe(self.token),
            None => false,
        }
    }
}

impl std::fmt::Debug for RegistryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryState")
            .field("listeners", &self.listeners.len())
            .field("next_token", &self.next_token)
            .field("epoch", &self.epoch)
            .finish()
    }
}
