use std::future::Future;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use tracing::{debug, trace, warn};

use crate::{
    config::FeedConfig,
    error::FeedError,
    stomp::{StompCommand, StompFrame},
};

const SUBSCRIPTION_ID: &str = "sub-0";

/// Opens sessions on the live position topic.
///
/// A session is already subscribed when `open` returns. Implementations must
/// not retry on their own; reconnecting is the manager's job.
pub trait FeedTransport: Send + Sync + 'static {
    type Session: FeedSession;

    fn open(&self) -> impl Future<Output = Result<Self::Session, FeedError>> + Send;
}

pub trait FeedSession: Send + 'static {
    /// Next position payload. `Ok(None)` means the server closed the session.
    fn next_message(&mut self) -> impl Future<Output = Result<Option<String>, FeedError>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send;
}

/// STOMP over a WebSocket, as served by the portal backend at `/ws`.
#[derive(Debug, Clone)]
pub struct StompWebSocketTransport {
    url: String,
    host: String,
    topic: String,
}

impl StompWebSocketTransport {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            url: config.websocket_url(),
            host: config.host().to_string(),
            topic: config.topic.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedTransport for StompWebSocketTransport {
    type Session = StompSession;

    async fn open(&self) -> Result<StompSession, FeedError> {
        debug!(url = %self.url, "Opening feed WebSocket");
        let (stream, _) = connect_async(self.url.as_str()).await?;

        let mut session = StompSession { stream };
        session.send(StompFrame::connect(&self.host)).await?;

        let connected = session.next_frame().await?.ok_or(FeedError::Closed)?;
        match connected.command {
            StompCommand::Connected => {
                debug!(
                    version = connected.get_header("version").unwrap_or("1.0"),
                    "STOMP session established"
                );
            }
            StompCommand::Error => return Err(rejection(&connected)),
            other => {
                return Err(FeedError::Rejected(format!(
                    "expected CONNECTED, got {other}"
                )));
            }
        }

        session
            .send(StompFrame::subscribe(SUBSCRIPTION_ID, &self.topic))
            .await?;
        debug!(topic = %self.topic, "Subscribed to position topic");

        Ok(session)
    }
}

pub struct StompSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl StompSession {
    async fn send(&mut self, frame: StompFrame) -> Result<(), FeedError> {
        self.stream.send(Message::text(frame.encode())).await?;
        Ok(())
    }

    /// Next STOMP frame, skipping heart-beats and control messages.
    async fn next_frame(&mut self) -> Result<Option<StompFrame>, FeedError> {
        while let Some(message) = self.stream.next().await {
            let text = match message? {
                Message::Text(text) => text,
                Message::Close(_) => return Ok(None),
                _ => continue,
            };

            if let Some(frame) = decode_frame(text.as_str()) {
                return Ok(Some(frame));
            }
        }

        Ok(None)
    }
}

/// Heart-beats and undecodable frames yield `None`; the latter are logged
/// and dropped without ending the session.
fn decode_frame(text: &str) -> Option<StompFrame> {
    match StompFrame::decode(text) {
        Ok(Some(frame)) => Some(frame),
        Ok(None) => {
            trace!("Heart-beat");
            None
        }
        Err(error) => {
            warn!(error = %error, frame = text, "Dropping malformed STOMP frame");
            None
        }
    }
}

impl FeedSession for StompSession {
    async fn next_message(&mut self) -> Result<Option<String>, FeedError> {
        loop {
            let Some(frame) = self.next_frame().await? else {
                return Ok(None);
            };

            match frame.command {
                StompCommand::Message => return Ok(Some(frame.body)),
                StompCommand::Error => return Err(rejection(&frame)),
                other => trace!(command = %other, "Ignoring STOMP frame"),
            }
        }
    }

    async fn close(mut self) {
        if let Err(error) = self.send(StompFrame::disconnect()).await {
            debug!(error = %error, "Failed to send DISCONNECT");
        }
        let _ = self.stream.close(None).await;
    }
}

fn rejection(frame: &StompFrame) -> FeedError {
    let message = frame
        .get_header("message")
        .map(str::to_string)
        .unwrap_or_else(|| frame.body.trim().to_string());

    FeedError::Rejected(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_config() {
        let transport = StompWebSocketTransport::new(&FeedConfig::with_base_url(
            "http://10.0.0.4:8080",
        ));

        assert_eq!(transport.url(), "ws://10.0.0.4:8080/ws");
        assert_eq!(transport.host, "10.0.0.4");
        assert_eq!(transport.topic, "/topic/bus-locations");
    }

    #[test]
    fn test_rejection_message() {
        let frame = StompFrame::new(StompCommand::Error).header("message", "Unknown topic");
        assert!(matches!(rejection(&frame), FeedError::Rejected(m) if m == "Unknown topic"));

        let mut frame = StompFrame::new(StompCommand::Error);
        frame.body = String::from("broker down\n");
        assert!(matches!(rejection(&frame), FeedError::Rejected(m) if m == "broker down"));
    }

    #[test]
    fn test_malformed_frames_are_skipped() {
        assert!(decode_frame("HELLO\n\n\0").is_none());
        assert!(decode_frame("MESSAGE\nkey:bad\\x\n\n{}\0").is_none());
        assert!(decode_frame("\n").is_none());

        let frame = decode_frame("MESSAGE\nsubscription:sub-0\n\n{}\0").unwrap();
        assert_eq!(frame.command, StompCommand::Message);
        assert_eq!(frame.body, "{}");
    }
}
