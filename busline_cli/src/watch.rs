use std::time::Duration;

use busline_core::{Vehicle, VehicleId};
use busline_feed::{
    FeedConnectionManager, SharedPositionStore, StompWebSocketTransport, seed_from_durable,
    spawn_connectivity_poller,
};
use busline_map::{LoggingSurface, MarkerReconciler, load_route_overlay};
use busline_providers::{
    DurableLocationClient, FleetRoster, HttpFleetRoster, HttpRouteDirectory, RouteDirectory,
};
use clap::Args;
use comfy_table::Table;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::{context::AppContext, parsers};

#[derive(Args)]
pub struct WatchArgs {
    /// Vehicle to select once the map is ready
    #[arg(short, long)]
    select: Option<VehicleId>,

    /// Stop after this long instead of waiting for Ctrl-C
    #[arg(short, long, value_parser = parsers::parse_period)]
    duration: Option<Duration>,

    /// How often the fleet roster is fetched again
    #[arg(long, value_parser = parsers::parse_period, default_value = "60s")]
    roster_refresh: Duration,
}

pub async fn run(args: WatchArgs, context: &AppContext) -> anyhow::Result<()> {
    let roster = HttpFleetRoster::new(context.api.clone());
    let durable = DurableLocationClient::new(context.api.clone());
    let directory = HttpRouteDirectory::new(context.api.clone());

    let vehicles = roster.vehicles().await?;
    info!(vehicles = vehicles.len(), "Fleet roster loaded");

    let store = SharedPositionStore::new();
    let manager = FeedConnectionManager::new(
        StompWebSocketTransport::new(&context.config),
        context.config.clone(),
    );

    // listen first so that live updates win over the durable seed
    let subscription = manager.add_listener(store.listener());

    let vehicle_ids: Vec<VehicleId> = vehicles.iter().map(Vehicle::id).collect();
    let report = seed_from_durable(&store, &durable, &vehicle_ids).await;
    info!(
        seeded = report.seeded,
        not_found = report.not_found,
        failed = report.failed,
        "Cold start positions loaded"
    );

    let (poller, mut badge) = spawn_connectivity_poller(manager.clone(), context.config.poll_interval);

    let mut reconciler = MarkerReconciler::new(LoggingSurface);
    reconciler.set_roster(vehicles);
    store.with(|positions| reconciler.reconcile(positions));

    if let Some(vehicle_id) = args.select {
        select_vehicle(&mut reconciler, &directory, vehicle_id).await;
    }

    let mut changes = store.changes();
    let mut roster_ticker = interval(args.roster_refresh);
    roster_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    roster_ticker.tick().await;

    let stop = stop_signal(args.duration);
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                store.with(|positions| reconciler.reconcile(positions));
            }
            changed = badge.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *badge.borrow_and_update();
                info!(status = %status, listeners = manager.listener_count(), "Feed status");
            }
            _ = roster_ticker.tick() => match roster.vehicles().await {
                Ok(vehicles) => {
                    reconciler.set_roster(vehicles);
                    store.with(|positions| reconciler.reconcile(positions));
                }
                Err(error) => warn!(error = %error, "Could not refresh the fleet roster"),
            },
        }
    }

    subscription.unsubscribe();
    manager.close().await;
    drop(badge);
    poller.abort();

    print_positions(&reconciler);

    Ok(())
}

async fn select_vehicle<D: RouteDirectory>(
    reconciler: &mut MarkerReconciler<LoggingSurface>,
    directory: &D,
    vehicle_id: VehicleId,
) {
    let Some(ticket) = reconciler.select(vehicle_id) else {
        warn!(%vehicle_id, "Vehicle is not part of the fleet roster");
        return;
    };

    match ticket.route_id {
        Some(route_id) => {
            let overlay = load_route_overlay(directory, route_id).await;
            reconciler.apply_route_overlay(ticket, overlay);
        }
        None => info!(%vehicle_id, "Vehicle has no assigned route"),
    }
}

async fn stop_signal(limit: Option<Duration>) {
    match limit {
        Some(limit) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = tokio::time::sleep(limit) => {}
            }
        }
        None => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

fn print_positions(reconciler: &MarkerReconciler<LoggingSurface>) {
    let mut table = Table::new();
    table.set_header(vec!["Vehicle", "Label", "Latitude", "Longitude", "Selected"]);

    let mut positions = reconciler.known_positions();
    positions.sort_by_key(|(vehicle_id, _)| *vehicle_id);

    for (vehicle_id, position) in positions {
        let Some(marker) = reconciler.marker(vehicle_id) else {
            continue;
        };

        table.add_row(vec![
            vehicle_id.to_string(),
            marker.label.clone(),
            format!("{:.5}", position.lat),
            format!("{:.5}", position.lng),
            if marker.selected { "yes" } else { "" }.to_string(),
        ]);
    }

    println!("{table}");
}
