//! Live vehicle position feed.
//!
//! ```text
//! FeedTransport (STOMP over WebSocket)
//!     │
//!     └── FeedConnectionManager (reconnect state machine)
//!             │
//!             └── ListenerRegistry ──► listener ──► SharedPositionStore
//!                                  ──► listener ──► ...
//! ```
//!
//! Every observer owns its own [`PositionStore`]; the registry only fans
//! updates out. The durable location store is used to seed a store at cold
//! start, see [`seed_from_durable`].

pub mod config;
pub mod connection_manager;
pub mod connection_state;
pub mod connectivity;
pub mod error;
pub mod frame;
pub mod listener_registry;
pub mod position_store;
pub mod stomp;
pub mod transport;

pub use config::{DEFAULT_FEED_URL, FEED_URL_ENV_VAR, FeedConfig};
pub use connection_manager::FeedConnectionManager;
pub use connection_state::{
    ConnectionAction, ConnectionEvent, ConnectionState, ConnectionStateMachine,
};
pub use connectivity::{ConnectivityBadge, spawn_connectivity_poller};
pub use error::FeedError;
pub use frame::{FrameError, parse_position_frame};
pub use listener_registry::{
    ListenerError, ListenerRegistry, PositionFeed, PositionListener, Subscription,
    SubscriptionToken,
};
pub use position_store::{PositionStore, SeedReport, SharedPositionStore, seed_from_durable};
pub use transport::{FeedSession, FeedTransport, StompWebSocketTransport};
