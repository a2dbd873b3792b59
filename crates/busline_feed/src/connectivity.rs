use std::{fmt::Display, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::info;

use crate::{
    connection_manager::FeedConnectionManager, connection_state::ConnectionState,
    transport::FeedTransport,
};

/// What the UI shows next to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityBadge {
    #[default]
    Offline,
    Connecting,
    Live,
}

impl From<ConnectionState> for ConnectivityBadge {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Disconnected => ConnectivityBadge::Offline,
            ConnectionState::Connecting => ConnectivityBadge::Connecting,
            ConnectionState::Connected => ConnectivityBadge::Live,
        }
    }
}

impl Display for ConnectivityBadge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectivityBadge::Offline => write!(f, "offline"),
            ConnectivityBadge::Connecting => write!(f, "connecting"),
            ConnectivityBadge::Live => write!(f, "live"),
        }
    }
}

/// Polls the manager every `period` and publishes badge changes.
///
/// The task ends once every receiver has been dropped.
pub fn spawn_connectivity_poller<T: FeedTransport>(
    manager: FeedConnectionManager<T>,
    period: Duration,
) -> (JoinHandle<()>, watch::Receiver<ConnectivityBadge>) {
    let (sender, receiver) = watch::channel(ConnectivityBadge::from(manager.state()));

    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if sender.is_closed() {
                break;
            }

            let badge = ConnectivityBadge::from(manager.state());
            sender.send_if_modified(|current| {
                if *current == badge {
                    return false;
                }
                info!(from = %current, to = %badge, "Feed connectivity changed");
                *current = badge;
                true
            });
        }
    });

    (handle, receiver)
}

#[cfg(test)]
mod tests {
    use busline_core::PositionUpdate;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{config::FeedConfig, error::FeedError, transport::FeedSession};

    struct ChannelSession(mpsc::UnboundedReceiver<String>);

    impl FeedSession for ChannelSession {
        async fn next_message(&mut self) -> Result<Option<String>, FeedError> {
            Ok(self.0.recv().await)
        }

        async fn close(self) {}
    }

    struct OneShotTransport(parking_lot::Mutex<Option<ChannelSession>>);

    impl FeedTransport for OneShotTransport {
        type Session = ChannelSession;

        async fn open(&self) -> Result<ChannelSession, FeedError> {
            self.0.lock().take().ok_or(FeedError::Closed)
        }
    }

    #[test]
    fn test_badge_from_state() {
        assert_eq!(
            ConnectivityBadge::from(ConnectionState::Disconnected),
            ConnectivityBadge::Offline
        );
        assert_eq!(
            ConnectivityBadge::from(ConnectionState::Connecting),
            ConnectivityBadge::Connecting
        );
        assert_eq!(ConnectivityBadge::from(ConnectionState::Connected).to_string(), "live");
    }

    async fn wait_for(badge: &mut watch::Receiver<ConnectivityBadge>, expected: ConnectivityBadge) {
        tokio::time::timeout(Duration::from_secs(30), async {
            while *badge.borrow_and_update() != expected {
                badge.changed().await.unwrap();
            }
        })
        .await
        .unwrap_or_else(|_| panic!("badge never became {expected}"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_follows_connection() {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = OneShotTransport(parking_lot::Mutex::new(Some(ChannelSession(rx))));
        let manager = FeedConnectionManager::new(transport, FeedConfig::default());

        let (handle, mut badge) = spawn_connectivity_poller(manager.clone(), Duration::from_secs(2));
        assert_eq!(*badge.borrow(), ConnectivityBadge::Offline);

        let (seen_tx, mut seen) = mpsc::unbounded_channel();
        manager.add_listener(move |update: &PositionUpdate| -> anyhow::Result<()> {
            seen_tx.send(update.vehicle_id)?;
            Ok(())
        });
        tx.send(String::from(r#"{"busId": 1, "latitude": 1, "longitude": 1}"#))
            .unwrap();
        seen.recv().await.unwrap();
        wait_for(&mut badge, ConnectivityBadge::Live).await;

        // session drops and the only transport attempt is used up
        drop(tx);
        wait_for(&mut badge, ConnectivityBadge::Connecting).await;
        assert!(!manager.is_connected());

        manager.disconnect();
        wait_for(&mut badge, ConnectivityBadge::Offline).await;

        drop(badge);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(handle.is_finished());
    }
}
