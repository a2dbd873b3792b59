use std::future::Future;

use busline_core::Vehicle;

use crate::{api_client::ApiClient, error::ProviderError};

const BUSES_PATH: &str = "api/buses";

/// The list of vehicles known to the fleet administration.
pub trait FleetRoster: Send + Sync {
    fn vehicles(&self) -> impl Future<Output = Result<Vec<Vehicle>, ProviderError>> + Send;
}

pub struct HttpFleetRoster {
    api: ApiClient,
}

impl HttpFleetRoster {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl FleetRoster for HttpFleetRoster {
    async fn vehicles(&self) -> Result<Vec<Vehicle>, ProviderError> {
        let vehicles: Vec<Vehicle> = self.api.get_json(BUSES_PATH).await?;

        tracing::debug!(vehicles = vehicles.len(), "Fleet roster fetched");

        Ok(vehicles)
    }
}
