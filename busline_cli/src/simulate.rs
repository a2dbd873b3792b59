use std::time::Duration;

use busline_core::{GeoPosition, RouteId, VehicleId, station::geocoded_in_order};
use busline_providers::{
    DurableLocationClient, DurableLocationStore, HttpRouteDirectory, RouteDirectory,
};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use jiff::Timestamp;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{context::AppContext, parsers};

#[derive(Args)]
pub struct SimulateArgs {
    /// Vehicle whose positions are submitted
    #[arg(short, long)]
    vehicle: VehicleId,

    /// Route to drive along
    #[arg(short, long)]
    route: RouteId,

    /// Delay between two submitted positions
    #[arg(short, long, value_parser = parsers::parse_period, default_value = "2s")]
    interval: Duration,

    /// Intermediate positions between two stations
    #[arg(short, long, default_value_t = 10)]
    steps: usize,

    /// Drive the route again, back and forth, until interrupted
    #[arg(long)]
    repeat: bool,
}

pub async fn run(args: SimulateArgs, context: &AppContext) -> anyhow::Result<()> {
    let directory = HttpRouteDirectory::new(context.api.clone());
    let durable = DurableLocationClient::new(context.api.clone());

    let stations = directory.route_stations(args.route).await?;
    let waypoints: Vec<GeoPosition> = geocoded_in_order(&stations)
        .into_iter()
        .map(|(_, position)| position)
        .collect();

    if waypoints.len() < 2 {
        anyhow::bail!(
            "Route {} has {} geocoded station(s), at least two are needed",
            args.route,
            waypoints.len()
        );
    }

    let mut path = interpolate_path(&waypoints, args.steps);
    info!(
        vehicle_id = %args.vehicle,
        route_id = %args.route,
        positions = path.len(),
        "Starting simulation"
    );

    let mut ticker = interval(args.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut submitted = 0usize;
    let mut failed = 0usize;

    loop {
        let bar = ProgressBar::new(path.len() as u64);
        bar.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);

        for position in &path {
            ticker.tick().await;

            match durable.submit(args.vehicle, *position, Timestamp::now()).await {
                Ok(ack) => {
                    debug!(lat = position.lat, lng = position.lng, ack = %ack, "Position submitted");
                    submitted += 1;
                }
                Err(error) => {
                    warn!(error = %error, "{}", error.user_message());
                    failed += 1;
                }
            }

            bar.set_message(format!("{failed} failed"));
            bar.inc(1);
        }

        bar.finish_and_clear();

        if !args.repeat {
            break;
        }
        path.reverse();
    }

    info!(submitted, failed, "Simulation finished");

    Ok(())
}

/// Positions along the polyline through `waypoints`, `steps` per segment,
/// starting at the first waypoint and ending exactly on the last one.
pub fn interpolate_path(waypoints: &[GeoPosition], steps: usize) -> Vec<GeoPosition> {
    let steps = steps.max(1);
    let mut path = Vec::with_capacity(waypoints.len().saturating_sub(1) * steps + 1);

    for pair in waypoints.windows(2) {
        for step in 0..steps {
            path.push(pair[0].point_at_ratio(&pair[1], step as f64 / steps as f64));
        }
    }

    if let Some(last) = waypoints.last() {
        path.push(*last);
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_path() {
        let waypoints = [
            GeoPosition::new(0.0, 0.0),
            GeoPosition::new(1.0, 0.0),
            GeoPosition::new(1.0, 2.0),
        ];

        let path = interpolate_path(&waypoints, 2);
        let expected = [
            GeoPosition::new(0.0, 0.0),
            GeoPosition::new(0.5, 0.0),
            GeoPosition::new(1.0, 0.0),
            GeoPosition::new(1.0, 1.0),
            GeoPosition::new(1.0, 2.0),
        ];

        assert_eq!(path.len(), expected.len());
        for (actual, expected) in path.iter().zip(&expected) {
            // great-circle midpoints sit within a few hundred meters of the flat ones
            assert!(actual.haversine_distance(expected) < 200.0, "{actual:?} vs {expected:?}");
        }
        assert_eq!(path[0], waypoints[0]);
        assert_eq!(path[4], waypoints[2]);
    }

    #[test]
    fn test_interpolate_single_waypoint() {
        let path = interpolate_path(&[GeoPosition::new(3.0, 4.0)], 5);
        assert_eq!(path, vec![GeoPosition::new(3.0, 4.0)]);

        assert!(interpolate_path(&[], 5).is_empty());
    }

    #[test]
    fn test_zero_steps_means_stations_only() {
        let waypoints = [GeoPosition::new(0.0, 0.0), GeoPosition::new(1.0, 1.0)];
        assert_eq!(interpolate_path(&waypoints, 0), waypoints.to_vec());
    }
}
