//! Write path and cold-start read path for vehicle positions.
//!
//! Submitting a position stores it in the location history and the
//! "latest" cache on the server, which then broadcasts it on the live feed.
//! Nothing is fanned out locally: a sender sees its own write only when it
//! comes back through the feed.

use std::future::Future;

use busline_core::{GeoPosition, VehicleId};
use jiff::Timestamp;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    api_client::{ApiClient, api_error, error_message, success_body},
    error::ProviderError,
};

const LOCATIONS_PATH: &str = "api/bus-locations";

/// Last position recorded by the durable store for one vehicle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurablePosition {
    pub bus_id: VehicleId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl DurablePosition {
    pub fn position(&self) -> GeoPosition {
        GeoPosition::new(self.latitude, self.longitude)
    }

    /// The server may send either an instant or a zone-less local date-time.
    pub fn recorded_at(&self) -> Option<Timestamp> {
        let raw = self.timestamp.as_deref()?;

        raw.parse::<Timestamp>().ok().or_else(|| {
            raw.parse::<jiff::civil::DateTime>()
                .ok()
                .and_then(|dt| dt.to_zoned(jiff::tz::TimeZone::UTC).ok())
                .map(|zoned| zoned.timestamp())
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPositionBody {
    bus_id: VehicleId,
    latitude: f64,
    longitude: f64,
    timestamp: Timestamp,
}

/// Durable position storage, abstracted so seeding and senders can be tested
/// without a server.
pub trait DurableLocationStore: Send + Sync {
    /// Stores a position. Returns the server's plain-text acknowledgement.
    fn submit(
        &self,
        vehicle_id: VehicleId,
        position: GeoPosition,
        timestamp: Timestamp,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    /// `Ok(None)` when the vehicle never reported a position. Lookup failures
    /// are errors and are never folded into `None` here.
    fn fetch_latest(
        &self,
        vehicle_id: VehicleId,
    ) -> impl Future<Output = Result<Option<DurablePosition>, ProviderError>> + Send;
}

pub struct DurableLocationClient {
    api: ApiClient,
}

impl DurableLocationClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn latest_path(vehicle_id: VehicleId) -> String {
        format!("{LOCATIONS_PATH}/{vehicle_id}/latest")
    }
}

impl DurableLocationStore for DurableLocationClient {
    async fn submit(
        &self,
        vehicle_id: VehicleId,
        position: GeoPosition,
        timestamp: Timestamp,
    ) -> Result<String, ProviderError> {
        let body = SubmitPositionBody {
            bus_id: vehicle_id,
            latitude: position.lat,
            longitude: position.lng,
            timestamp,
        };

        let response = self
            .api
            .http()
            .post(self.api.url(LOCATIONS_PATH))
            .json(&body)
            .send()
            .await?;

        let ack = success_body(response).await?;

        tracing::debug!(%vehicle_id, ack = ack.trim(), "Position submitted");

        Ok(ack.trim().to_string())
    }

    async fn fetch_latest(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<Option<DurablePosition>, ProviderError> {
        let response = self
            .api
            .http()
            .get(self.api.url(&Self::latest_path(vehicle_id)))
            .send()
            .await?;

        let status = response.status();
        if is_not_found(status) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let body = response.text().await?;
        parse_latest_response(status, &body)
    }
}

fn is_not_found(status: StatusCode) -> bool {
    status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND
}

fn parse_latest_response(
    status: StatusCode,
    body: &str,
) -> Result<Option<DurablePosition>, ProviderError> {
    if is_not_found(status) {
        return Ok(None);
    }

    if !status.is_success() {
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message: error_message(status, body),
        });
    }

    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(trimmed)?))
}
