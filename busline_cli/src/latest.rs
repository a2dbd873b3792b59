use busline_core::VehicleId;
use busline_providers::{DurableLocationClient, DurableLocationStore};
use clap::Args;
use tracing::info;

use crate::context::AppContext;

#[derive(Args)]
pub struct LatestArgs {
    /// Vehicle id
    vehicle: VehicleId,
}

pub async fn run(args: LatestArgs, context: &AppContext) -> anyhow::Result<()> {
    let durable = DurableLocationClient::new(context.api.clone());

    match durable.fetch_latest(args.vehicle).await {
        Ok(Some(latest)) => {
            let recorded_at = latest
                .recorded_at()
                .map(|timestamp| timestamp.to_string())
                .unwrap_or_else(|| String::from("unknown"));

            info!(
                vehicle_id = %args.vehicle,
                lat = latest.latitude,
                lng = latest.longitude,
                recorded_at = %recorded_at,
                "Last known position"
            );
        }
        Ok(None) => info!(vehicle_id = %args.vehicle, "No position recorded yet"),
        Err(error) => anyhow::bail!("Could not fetch the last position: {}", error.user_message()),
    }

    Ok(())
}
