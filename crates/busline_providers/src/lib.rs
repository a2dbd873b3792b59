pub mod api_client;
pub mod durable_location;
pub mod error;
pub mod fleet_roster;
pub mod route_directory;

pub use api_client::{ApiClient, ApiClientParams, DEFAULT_API_BASE_URL};
pub use durable_location::{DurableLocationClient, DurableLocationStore, DurablePosition};
pub use error::ProviderError;
pub use fleet_roster::{FleetRoster, HttpFleetRoster};
pub use route_directory::{HttpRouteDirectory, RouteDirectory};
