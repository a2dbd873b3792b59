use clap::{Parser, Subcommand};

#[cfg(not(feature = "dhat-heap"))]
use mimalloc::MiMalloc;
use tracing::debug;

use crate::{
    context::AppContext, latest::LatestArgs, schedule::ScheduleArgs, simulate::SimulateArgs,
    watch::WatchArgs,
};

mod context;
mod latest;
mod parsers;
mod schedule;
mod simulate;
mod watch;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[cfg(not(feature = "dhat-heap"))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the live feed and reconcile the fleet map
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: WatchArgs,
    },
    /// Drive a vehicle along its route and submit positions
    Simulate {
        #[command(flatten)]
        args: SimulateArgs,
    },
    /// Print the arrival table of a route
    Schedule {
        #[command(flatten)]
        args: ScheduleArgs,
    },
    /// Last durably recorded position of a vehicle
    Latest {
        #[command(flatten)]
        args: LatestArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    dotenvy::from_filename("./.env.local").ok();

    match cli.command {
        Some(Commands::Watch { args }) => watch::run(args, &AppContext::from_env()?).await?,
        Some(Commands::Simulate { args }) => {
            simulate::run(args, &AppContext::from_env()?).await?
        }
        Some(Commands::Schedule { args }) => schedule::run(args)?,
        Some(Commands::Latest { args }) => latest::run(args, &AppContext::from_env()?).await?,
        None => debug!("No command given"),
    }

    Ok(())
}
