//! Reconnection policy as a plain state machine.
//!
//! The machine never sleeps or spawns anything; it is handed the current
//! instant with every event and answers with the action the runtime must
//! take. That keeps the fixed-delay policy testable with made-up instants.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Opening a session, or waiting for the retry delay to elapse.
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    ConnectRequested,
    SessionEstablished,
    TransportLost,
    RetryElapsed,
    DisconnectRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    OpenTransport,
    WaitForRetry { until: Instant },
    CloseTransport,
    Nothing,
}

#[derive(Debug, Clone)]
pub struct ConnectionStateMachine {
    state: ConnectionState,
    reconnect_delay: Duration,
    retry_at: Option<Instant>,
    attempts: u32,
}

impl ConnectionStateMachine {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay,
            retry_at: None,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Pending retry, if the transport was lost and not reopened yet.
    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Consecutive failed attempts since the last established session.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn handle(&mut self, event: ConnectionEvent, now: Instant) -> ConnectionAction {
        use ConnectionAction as A;
        use ConnectionEvent as E;
        use ConnectionState as S;

        match (self.state, event) {
            (S::Disconnected, E::ConnectRequested) => {
                self.state = S::Connecting;
                self.retry_at = None;
                self.attempts = 0;
                A::OpenTransport
            }
            (S::Connecting | S::Connected, E::ConnectRequested) => A::Nothing,

            (S::Connecting, E::SessionEstablished) if self.retry_at.is_none() => {
                self.state = S::Connected;
                self.attempts = 0;
                A::Nothing
            }

            (S::Connecting | S::Connected, E::TransportLost) => {
                let until = now + self.reconnect_delay;
                self.state = S::Connecting;
                self.retry_at = Some(until);
                self.attempts = self.attempts.saturating_add(1);
                A::WaitForRetry { until }
            }

            (S::Connecting, E::RetryElapsed) => match self.retry_at {
                Some(until) if now >= until => {
                    self.retry_at = None;
                    A::OpenTransport
                }
                Some(until) => A::WaitForRetry { until },
                None => A::Nothing,
            },

            (S::Connecting | S::Connected, E::DisconnectRequested) => {
                self.state = S::Disconnected;
                self.retry_at = None;
                self.attempts = 0;
                A::CloseTransport
            }

            // late events from a session that was already torn down
            _ => A::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(5);

    #[test]
    fn test_connect_is_idempotent() {
        let now = Instant::now();
        let mut machine = ConnectionStateMachine::new(DELAY);

        assert_eq!(
            machine.handle(ConnectionEvent::ConnectRequested, now),
            ConnectionAction::OpenTransport
        );
        assert_eq!(
            machine.handle(ConnectionEvent::ConnectRequested, now),
            ConnectionAction::Nothing
        );

        machine.handle(ConnectionEvent::SessionEstablished, now);
        assert!(machine.is_connected());
        assert_eq!(
            machine.handle(ConnectionEvent::ConnectRequested, now),
            ConnectionAction::Nothing
        );
    }

    #[test]
    fn test_lost_transport_waits_fixed_delay() {
        let now = Instant::now();
        let mut machine = ConnectionStateMachine::new(DELAY);
        machine.handle(ConnectionEvent::ConnectRequested, now);
        machine.handle(ConnectionEvent::SessionEstablished, now);

        let lost_at = now + Duration::from_secs(60);
        assert_eq!(
            machine.handle(ConnectionEvent::TransportLost, lost_at),
            ConnectionAction::WaitForRetry {
                until: lost_at + DELAY
            }
        );
        assert_eq!(machine.state(), ConnectionState::Connecting);
        assert!(!machine.is_connected());

        // too early
        assert_eq!(
            machine.handle(ConnectionEvent::RetryElapsed, lost_at + Duration::from_secs(1)),
            ConnectionAction::WaitForRetry {
                until: lost_at + DELAY
            }
        );

        assert_eq!(
            machine.handle(ConnectionEvent::RetryElapsed, lost_at + DELAY),
            ConnectionAction::OpenTransport
        );
        assert_eq!(machine.retry_at(), None);

        machine.handle(ConnectionEvent::SessionEstablished, lost_at + DELAY);
        assert!(machine.is_connected());
        assert_eq!(machine.attempts(), 0);
    }

    #[test]
    fn test_delay_does_not_grow() {
        let mut now = Instant::now();
        let mut machine = ConnectionStateMachine::new(DELAY);
        machine.handle(ConnectionEvent::ConnectRequested, now);

        for attempt in 1..=4 {
            let action = machine.handle(ConnectionEvent::TransportLost, now);
            assert_eq!(action, ConnectionAction::WaitForRetry { until: now + DELAY });
            assert_eq!(machine.attempts(), attempt);

            now += DELAY;
            assert_eq!(
                machine.handle(ConnectionEvent::RetryElapsed, now),
                ConnectionAction::OpenTransport
            );
        }
    }

    #[test]
    fn test_disconnect_cancels_pending_retry() {
        let now = Instant::now();
        let mut machine = ConnectionStateMachine::new(DELAY);
        machine.handle(ConnectionEvent::ConnectRequested, now);
        machine.handle(ConnectionEvent::TransportLost, now);

        assert_eq!(
            machine.handle(ConnectionEvent::DisconnectRequested, now),
            ConnectionAction::CloseTransport
        );
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert_eq!(machine.retry_at(), None);

        assert_eq!(
            machine.handle(ConnectionEvent::RetryElapsed, now + DELAY),
            ConnectionAction::Nothing
        );
        assert_eq!(
            machine.handle(ConnectionEvent::DisconnectRequested, now),
            ConnectionAction::Nothing
        );
    }

    #[test]
    fn test_stale_events_after_disconnect_are_ignored() {
        let now = Instant::now();
        let mut machine = ConnectionStateMachine::new(DELAY);

        assert_eq!(
            machine.handle(ConnectionEvent::SessionEstablished, now),
            ConnectionAction::Nothing
        );
        assert_eq!(
            machine.handle(ConnectionEvent::TransportLost, now),
            ConnectionAction::Nothing
        );
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_session_cannot_be_established_while_waiting() {
        let now = Instant::now();
        let mut machine = ConnectionStateMachine::new(DELAY);
        machine.handle(ConnectionEvent::ConnectRequested, now);
        machine.handle(ConnectionEvent::TransportLost, now);

        assert_eq!(
            machine.handle(ConnectionEvent::SessionEstablished, now),
            ConnectionAction::Nothing
        );
        assert_eq!(machine.state(), ConnectionState::Connecting);
    }
}
