use std::sync::{Arc, Weak};

use busline_core::PositionUpdate;
use parking_lot::Mutex;
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, info, warn};

use crate::{
    config::FeedConfig,
    connection_state::{ConnectionAction, ConnectionEvent, ConnectionState, ConnectionStateMachine},
    frame::parse_position_frame,
    listener_registry::{ListenerRegistry, PositionFeed, PositionListener, Subscription, SubscriptionToken},
    transport::{FeedSession, FeedTransport},
};

struct RunningConnection {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

struct Lifecycle {
    machine: ConnectionStateMachine,
    /// Bumped on every connect and disconnect so a task that outlived its
    /// session cannot move the state machine anymore.
    generation: u64,
    running: Option<RunningConnection>,
}

/// Owns the single subscription to the live position topic and fans every
/// valid frame out to its listeners.
///
/// Handles are cheap to clone and all point to the same connection. Build
/// one per composition root; nothing here is global.
pub struct FeedConnectionManager<T: FeedTransport> {
    transport: Arc<T>,
    registry: ListenerRegistry,
    config: Arc<FeedConfig>,
    lifecycle: Arc<Mutex<Lifecycle>>,
}

impl<T: FeedTransport> Clone for FeedConnectionManager<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            registry: self.registry.clone(),
            config: Arc::clone(&self.config),
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }
}

impl<T: FeedTransport> FeedConnectionManager<T> {
    pub fn new(transport: T, config: FeedConfig) -> Self {
        let machine = ConnectionStateMachine::new(config.reconnect_delay);

        Self {
            transport: Arc::new(transport),
            registry: ListenerRegistry::new(),
            config: Arc::new(config),
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                machine,
                generation: 0,
                running: None,
            })),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Starts the connection task unless one is already connecting or
    /// connected. Must be called from within a tokio runtime.
    pub fn connect(&self) {
        let mut lifecycle = self.lifecycle.lock();

        match lifecycle
            .machine
            .handle(ConnectionEvent::ConnectRequested, Instant::now())
        {
            ConnectionAction::OpenTransport => {
                lifecycle.generation += 1;

                let (shutdown, shutdown_rx) = oneshot::channel();
                let task = ConnectionTask {
                    transport: Arc::clone(&self.transport),
                    registry: self.registry.clone(),
                    lifecycle: Arc::downgrade(&self.lifecycle),
                    generation: lifecycle.generation,
                    epoch: self.registry.epoch(),
                };

                info!(
                    url = %self.config.base_url,
                    topic = %self.config.topic,
                    "Connecting to position feed"
                );
                let handle = tokio::spawn(task.run(shutdown_rx));
                lifecycle.running = Some(RunningConnection { shutdown, handle });
            }
            _ => debug!(state = ?lifecycle.machine.state(), "Feed already connecting"),
        }
    }

    /// Tears the transport down and drops every listener.
    ///
    /// Returns immediately; the session is closed in the background.
    pub fn disconnect(&self) {
        let running = {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle
                .machine
                .handle(ConnectionEvent::DisconnectRequested, Instant::now());
            lifecycle.generation += 1;
            self.registry.clear();
            lifecycle.running.take()
        };

        if let Some(running) = running {
            let _ = running.shutdown.send(());
            info!("Disconnected from position feed");
        }
    }

    /// Like [`Self::disconnect`], but waits for the session to be closed.
    pub async fn close(&self) {
        let running = {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle
                .machine
                .handle(ConnectionEvent::DisconnectRequested, Instant::now());
            lifecycle.generation += 1;
            self.registry.clear();
            lifecycle.running.take()
        };

        if let Some(RunningConnection { shutdown, handle }) = running {
            let _ = shutdown.send(());
            if let Err(error) = handle.await {
                warn!(error = %error, "Feed connection task failed");
            }
            info!("Position feed closed");
        }
    }

    /// Registers `listener` and connects if needed.
    ///
    /// Unsubscribing the last listener keeps the connection open; only
    /// [`Self::disconnect`] closes it.
    pub fn add_listener<L>(&self, listener: L) -> Subscription
    where
        L: PositionListener + 'static,
    {
        let token = self.registry.subscribe(listener);
        self.connect();
        self.registry.subscription(token)
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.lock().machine.state()
    }

    pub fn is_connected(&self) -> bool {
        self.lifecycle.lock().machine.is_connected()
    }
}

impl<T: FeedTransport> PositionFeed for FeedConnectionManager<T> {
    fn subscribe<L>(&self, listener: L) -> SubscriptionToken
    where
        L: PositionListener + 'static,
    {
        self.add_listener(listener).token()
    }

    fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.registry.unsubscribe(token)
    }

    /// Injects an update as if it came from the feed.
    fn publish(&self, update: PositionUpdate) -> usize {
        self.registry.publish(update)
    }
}

enum SessionEnd {
    Shutdown,
    Lost(String),
}

struct ConnectionTask<T: FeedTransport> {
    transport: Arc<T>,
    registry: ListenerRegistry,
    lifecycle: Weak<Mutex<Lifecycle>>,
    generation: u64,
    /// Registry epoch at connect time. Frames are only delivered to the
    /// listeners of that epoch.
    epoch: u64,
}

impl<T: FeedTransport> ConnectionTask<T> {
    /// Feeds `event` to the state machine, unless this task was superseded
    /// or the manager is gone.
    fn transition(&self, event: ConnectionEvent) -> Option<ConnectionAction> {
        let lifecycle = self.lifecycle.upgrade()?;
        let mut lifecycle = lifecycle.lock();

        if lifecycle.generation != self.generation {
            return None;
        }

        Some(lifecycle.machine.handle(event, Instant::now()))
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            let opened = tokio::select! {
                biased;
                _ = &mut shutdown => return,
                opened = self.transport.open() => opened,
            };

            match opened {
                Ok(mut session) => {
                    if self.transition(ConnectionEvent::SessionEstablished).is_none() {
                        session.close().await;
                        return;
                    }
                    info!("Position feed connected");

                    match self.pump(&mut session, &mut shutdown).await {
                        SessionEnd::Shutdown => {
                            session.close().await;
                            return;
                        }
                        SessionEnd::Lost(reason) => {
                            warn!(reason = %reason, "Position feed connection lost");
                        }
                    }
                }
                Err(error) => warn!(error = %error, "Position feed connection failed"),
            }

            let mut until = match self.transition(ConnectionEvent::TransportLost) {
                Some(ConnectionAction::WaitForRetry { until }) => until,
                _ => return,
            };

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => return,
                    _ = sleep_until(until) => {}
                }

                match self.transition(ConnectionEvent::RetryElapsed) {
                    Some(ConnectionAction::OpenTransport) => break,
                    Some(ConnectionAction::WaitForRetry { until: later }) => until = later,
                    _ => return,
                }
            }

            info!("Reconnecting to position feed");
        }
    }

    async fn pump(
        &self,
        session: &mut T::Session,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> SessionEnd {
        loop {
            let message = tokio::select! {
                biased;
                _ = &mut *shutdown => return SessionEnd::Shutdown,
                message = session.next_message() => message,
            };

            let payload = match message {
                Ok(Some(payload)) => payload,
                Ok(None) => return SessionEnd::Lost(String::from("closed by server")),
                Err(error) => return SessionEnd::Lost(error.to_string()),
            };

            match parse_position_frame(&payload) {
                Ok(update) => {
                    if self.registry.publish_in_epoch(self.epoch, update).is_none() {
                        return SessionEnd::Shutdown;
                    }
                }
                Err(error) => warn!(error = %error, payload = %payload, "Dropping position frame"),
            }
        }
    }
}
