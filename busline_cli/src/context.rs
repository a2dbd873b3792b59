use busline_feed::FeedConfig;
use busline_providers::{ApiClient, ApiClientParams};
use tracing::debug;

/// Everything built from the environment, shared by the subcommands.
pub struct AppContext {
    pub config: FeedConfig,
    pub api: ApiClient,
}

impl AppContext {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = FeedConfig::from_env();
        let api = ApiClient::new(ApiClientParams {
            base_url: config.base_url.clone(),
            ..ApiClientParams::default()
        })?;

        debug!(base_url = %config.base_url, websocket = %config.websocket_url(), "Configuration loaded");

        Ok(Self { config, api })
    }
}
