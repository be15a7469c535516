use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::broadcast::{SimulationConfig, DEFAULT_FLIGHT_NUMBER};
use crate::constants::*;
use crate::error::{Error, Result};
use crate::net::MulticastConfig;
use crate::packet::Revision;
use crate::telemetry::TemperatureModel;

/// Flight telemetry multicast simulator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Departure airport (IATA code)
    #[arg(default_value = DEFAULT_DEPARTURE)]
    pub departure: String,

    /// Destination airport (IATA code)
    #[arg(default_value = DEFAULT_DESTINATION)]
    pub destination: String,

    /// Airport reference table (CSV with FourLetId, ThreeLetId, Lat, Lon, PointGeoRefId)
    #[arg(long, value_name = "FILE", default_value = AIRPORT_DATA_FILE)]
    pub airports: PathBuf,

    /// Multicast group to send telemetry to
    #[arg(long, default_value = MULTICAST_GROUP)]
    pub group: Ipv4Addr,

    /// Destination UDP port
    #[arg(long, default_value_t = MULTICAST_PORT)]
    pub port: u16,

    /// Multicast time-to-live
    #[arg(long, default_value_t = MULTICAST_TTL)]
    pub ttl: u32,

    /// Local interface address to send from (discovered when omitted)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<Ipv4Addr>,

    /// Tick period in milliseconds
    #[arg(long, default_value_t = TICK_PERIOD_MS)]
    pub tick_ms: u64,

    /// Scheduled flight duration in seconds; phase timings scale with it
    #[arg(long, default_value_t = TOTAL_FLIGHT_SECONDS)]
    pub flight_seconds: f64,

    /// Packet layout revision
    #[arg(long, value_enum, default_value_t = Revision::Rev7)]
    pub revision: Revision,

    /// Temperature model for the Mach computation (defaults to the revision's own)
    #[arg(long, value_enum)]
    pub temperature: Option<TemperatureModel>,

    /// Flight identifier carried by rev6 packets
    #[arg(long, default_value = DEFAULT_FLIGHT_NUMBER)]
    pub flight_number: String,

    /// Stop this many seconds after the scheduled arrival instead of running until Ctrl-C
    #[arg(long, value_name = "SECS")]
    pub grace: Option<f64>,

    /// Show a live progress line on stdout
    #[arg(long, default_value_t = false)]
    pub progress: bool,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    pub fn simulation(&self) -> Result<SimulationConfig> {
        let grace = self
            .grace
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| Error::Config(format!("grace of {}s is not usable: {}", secs, e)))
            })
            .transpose()?;
        let config = SimulationConfig {
            flight_seconds: self.flight_seconds,
            tick: Duration::from_millis(self.tick_ms),
            revision: self.revision,
            temperature: self.temperature,
            flight_number: self.flight_number.clone(),
            grace,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn multicast(&self) -> Result<MulticastConfig> {
        let config = MulticastConfig {
            group: self.group,
            port: self.port,
            ttl: self.ttl,
            bind: self.bind,
        };
        config.validate()?;
        Ok(config)
    }
}
