// Flightfeed - Main Entry Point
// Simulates a flight between two airports and multicasts its telemetry
// Licensed under AGPL v3

use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use flightfeed::airport::AirportDirectory;
use flightfeed::broadcast::{Broadcaster, Simulator};
use flightfeed::config::Config;
use flightfeed::net::MulticastSender;
use flightfeed::progress::ProgressLine;
use flightfeed::route::Route;

fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> flightfeed::Result<()> {
    let simulation = config.simulation()?;
    let multicast = config.multicast()?;

    let directory = AirportDirectory::from_path(&config.airports)?;
    info!("Loaded {} airports from {}", directory.len(), config.airports.display());

    let route = Route::resolve(&directory, &config.departure, &config.destination)?;
    for airport in [&route.departure, &route.destination] {
        if !airport.has_city_ref() {
            warn!("{} has no city reference id, sending INVALID", airport.iata);
        }
    }
    info!("Route: {} ({:.0} nm)", route, route.distance_nm());

    let simulator = Simulator::new(route, &simulation, Utc::now())?;
    info!(
        "Packet format: {} {} ({} bytes)",
        simulator.revision(),
        simulator.layout().format_string(),
        simulator.layout().size()
    );

    let sender = MulticastSender::open(&multicast).await?;
    let mut broadcaster = Broadcaster::new(simulator, sender, &simulation);
    if config.progress {
        let out: Box<dyn std::io::Write> = Box::new(std::io::stdout());
        broadcaster = broadcaster.with_progress(ProgressLine::new(out, simulation.flight_seconds));
    }

    broadcaster
        .run(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Unable to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}
