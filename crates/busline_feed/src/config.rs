use std::time::Duration;

/// Environment variable holding the base address of the feed and REST API.
pub const FEED_URL_ENV_VAR: &str = "BUSLINE_FEED_URL";

pub const DEFAULT_FEED_URL: &str = "http://localhost:8080";

pub const DEFAULT_WEBSOCKET_PATH: &str = "/ws";

pub const DEFAULT_TOPIC: &str = "/topic/bus-locations";

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// `http(s)://host:port` of the portal backend.
    pub base_url: String,

    pub websocket_path: String,

    /// The single topic carrying position frames.
    pub topic: String,

    /// Fixed delay before reopening a lost connection.
    pub reconnect_delay: Duration,

    /// How often the connectivity badge polls the connection state.
    pub poll_interval: Duration,
}

impl FeedConfig {
    /// Reads [`FEED_URL_ENV_VAR`], falling back to [`DEFAULT_FEED_URL`].
    pub fn from_env() -> Self {
        match std::env::var(FEED_URL_ENV_VAR) {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(url.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// WebSocket address derived from the base URL (`http` → `ws`, `https` → `wss`).
    pub fn websocket_url(&self) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };

        format!("{}{}", base, self.websocket_path)
    }

    /// Host name announced in the STOMP CONNECT frame.
    pub fn host(&self) -> &str {
        let without_scheme = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);

        without_scheme
            .split(['/', ':'])
            .next()
            .unwrap_or(without_scheme)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
            websocket_path: DEFAULT_WEBSOCKET_PATH.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
