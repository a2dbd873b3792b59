use thiserror::Error;

use crate::stomp::StompError;

/// Transport and protocol failures. They are logged and recovered by
/// reconnecting; listeners never see them.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("STOMP error: {0}")]
    Stomp(#[from] StompError),

    #[error("Server rejected the session: {0}")]
    Rejected(String),

    #[error("Connection closed by the server")]
    Closed,

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::WebSocket(Box::new(error))
    }
}
