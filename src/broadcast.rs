// Broadcast loop - drives the simulation at a fixed tick and emits one packet per tick
//
// Each tick: elapsed since start -> state advance -> snapshot -> encode -> send.
// Encoding errors end the run; send errors only drop the tick.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::constants::{TICK_PERIOD_MS, TOTAL_FLIGHT_SECONDS};
use crate::error::{Error, Result};
use crate::net::PacketSink;
use crate::packet::ascii::pad_ascii;
use crate::packet::{Frame, Layout, PacketError, Revision};
use crate::phase::{FlightPhase, PhaseSchedule, SimulationState};
use crate::progress::ProgressLine;
use crate::route::Route;
use crate::telemetry::{DerivationProfile, TelemetrySnapshot, TemperatureModel, WallClock};

/// Flight flown identifier sent by revisions that carry one.
pub const DEFAULT_FLIGHT_NUMBER: &str = "RC901";

/// Run parameters that do not concern the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Scheduled flight duration; the phase schedule is stretched to match
    pub flight_seconds: f64,
    pub tick: Duration,
    pub revision: Revision,
    /// Overrides the revision's own temperature model
    pub temperature: Option<TemperatureModel>,
    pub flight_number: String,
    /// Stop once elapsed exceeds the flight time by this much; run until Ctrl-C when `None`
    pub grace: Option<Duration>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            flight_seconds: TOTAL_FLIGHT_SECONDS,
            tick: Duration::from_millis(TICK_PERIOD_MS),
            revision: Revision::default(),
            temperature: None,
            flight_number: DEFAULT_FLIGHT_NUMBER.to_string(),
            grace: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.flight_seconds.is_finite() && self.flight_seconds > 0.0) {
            return Err(Error::Config(format!(
                "flight time must be positive, got {}",
                self.flight_seconds
            )));
        }
        let flight = self.flight_duration()?;
        if self.tick.is_zero() {
            return Err(Error::Config("tick period must be non-zero".to_string()));
        }
        if let Some(grace) = self.grace {
            if flight.checked_add(grace).is_none() {
                return Err(Error::Config(format!(
                    "flight time {}s plus grace {}s is out of range",
                    self.flight_seconds,
                    grace.as_secs_f64()
                )));
            }
        }
        Ok(())
    }

    fn flight_duration(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.flight_seconds).map_err(|e| {
            Error::Config(format!("flight time {}s is out of range: {}", self.flight_seconds, e))
        })
    }

    /// Elapsed time after which a bounded run stops. `None` when unbounded or
    /// when the limit is not representable, which `validate` rejects.
    pub fn run_limit(&self) -> Option<Duration> {
        let grace = self.grace?;
        Duration::try_from_secs_f64(self.flight_seconds)
            .ok()?
            .checked_add(grace)
    }
}

/// Output of one simulation step.
#[derive(Debug, Clone)]
pub struct Tick {
    pub packet: Vec<u8>,
    pub snapshot: TelemetrySnapshot,
    /// Phase left during this step, if any
    pub left_phase: Option<FlightPhase>,
}

/// Simulation state plus everything needed to turn it into packets.
pub struct Simulator {
    route: Route,
    schedule: PhaseSchedule,
    profile: DerivationProfile,
    layout: Layout,
    revision: Revision,
    flight_number: String,
    departed_at: DateTime<Utc>,
    state: SimulationState,
}

impl Simulator {
    /// Validate the configuration and the packet layout before the first tick.
    pub fn new(route: Route, config: &SimulationConfig, departed_at: DateTime<Utc>) -> Result<Self> {
        config.validate()?;

        let revision = config.revision;
        let layout = revision.layout()?;
        if layout.size() != revision.expected_size() {
            return Err(PacketError::SizeMismatch {
                layout: layout.name(),
                expected: revision.expected_size(),
                actual: layout.size(),
            }
            .into());
        }
        pad_ascii(&config.flight_number, 8)?;

        Ok(Simulator {
            state: SimulationState::new(&route),
            schedule: PhaseSchedule::scaled(config.flight_seconds),
            profile: revision.profile(config.temperature),
            layout,
            revision,
            flight_number: config.flight_number.trim().to_uppercase(),
            departed_at,
            route,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    pub fn departed_at(&self) -> DateTime<Utc> {
        self.departed_at
    }

    /// Advance to `elapsed` seconds and encode the packet for that instant.
    pub fn step(&mut self, elapsed: f64, now: DateTime<Utc>) -> Result<Tick> {
        let left_phase = self.state.advance(elapsed, &self.route, &self.schedule);
        let clock = WallClock {
            now,
            departed_at: self.departed_at,
        };
        let snapshot =
            TelemetrySnapshot::derive(&self.route, &self.state, &self.schedule, &self.profile, &clock);
        let packet = self.layout.encode(&Frame {
            snapshot: &snapshot,
            route: &self.route,
            flight_number: &self.flight_number,
        })?;
        Ok(Tick {
            packet,
            snapshot,
            left_phase,
        })
    }
}

/// Counters reported when the loop returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub sent: u64,
    pub send_failures: u64,
    pub final_phase: FlightPhase,
}

/// Owns the simulator and the sink for the lifetime of a run.
pub struct Broadcaster<S: PacketSink> {
    simulator: Simulator,
    sink: S,
    tick: Duration,
    run_limit: Option<Duration>,
    progress: Option<ProgressLine<Box<dyn std::io::Write>>>,
}

impl<S: PacketSink> Broadcaster<S> {
    pub fn new(simulator: Simulator, sink: S, config: &SimulationConfig) -> Self {
        Broadcaster {
            simulator,
            sink,
            tick: config.tick,
            run_limit: config.run_limit(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressLine<Box<dyn std::io::Write>>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run until `shutdown` resolves or the bounded run limit is passed.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let start = Instant::now();

        let mut summary = RunSummary {
            ticks: 0,
            sent: 0,
            send_failures: 0,
            final_phase: self.simulator.state().phase(),
        };

        info!(
            "Flight {} started, {:.0}s scheduled, {} packets of {} bytes every {}ms",
            self.simulator.route(),
            self.simulator.schedule().total_seconds(),
            self.simulator.revision(),
            self.simulator.layout().size(),
            self.tick.as_millis()
        );

        let result = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Received shutdown signal");
                    break Ok(());
                }
                _ = ticker.tick() => {
                    let elapsed = start.elapsed();
                    if let Some(limit) = self.run_limit {
                        if elapsed > limit {
                            info!("Run limit of {:.1}s reached", limit.as_secs_f64());
                            break Ok(());
                        }
                    }
                    if let Err(e) = self.tick_once(elapsed, &mut summary) {
                        break Err(e);
                    }
                }
            }
        };

        if let Some(progress) = self.progress.as_mut() {
            progress.finish();
        }
        info!(
            "Simulation finished at {}s in phase {}: {} ticks, {} sent, {} send failures",
            self.simulator.state().elapsed_seconds() as i64,
            summary.final_phase,
            summary.ticks,
            summary.sent,
            summary.send_failures
        );
        result.map(|_| summary)
    }

    fn tick_once(&mut self, elapsed: Duration, summary: &mut RunSummary) -> Result<()> {
        let now = chrono::Duration::from_std(elapsed)
            .map(|offset| self.simulator.departed_at() + offset)
            .unwrap_or_else(|_| Utc::now());
        let tick = self.simulator.step(elapsed.as_secs_f64(), now)?;
        let snap = &tick.snapshot;

        if let Some(previous) = tick.left_phase {
            info!("Phase change: {} -> {} at {:.1}s", previous, snap.phase, snap.elapsed_seconds);
            if snap.phase.is_terminal() {
                info!("Arrived at {}, holding position", self.simulator.route().destination.iata);
            }
        }
        debug!(
            "t={:.1}s phase={} lat={:.4} lon={:.4} alt={:.0} hdg={:.1}",
            snap.elapsed_seconds,
            snap.phase.code(),
            snap.lat,
            snap.lon,
            snap.altitude_ft,
            snap.heading
        );

        match self.sink.send_packet(&tick.packet) {
            Ok(_) => summary.sent += 1,
            Err(e) => {
                summary.send_failures += 1;
                warn!("Dropped packet at {:.1}s: {}", snap.elapsed_seconds, e);
            }
        }
        if let Some(progress) = self.progress.as_mut() {
            progress.update(snap);
        }

        summary.ticks += 1;
        summary.final_phase = snap.phase;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::tests::jfk_ord;
    use chrono::TimeZone;
    use std::io;

    /// Records every packet; optionally fails every n-th send.
    #[derive(Default)]
    struct RecordingSink {
        packets: Vec<Vec<u8>>,
        fail_every: Option<usize>,
        attempts: usize,
    }

    impl PacketSink for RecordingSink {
        fn send_packet(&mut self, packet: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            if let Some(n) = self.fail_every {
                if self.attempts % n == 0 {
                    return Err(io::Error::new(io::ErrorKind::WouldBlock, "socket busy"));
                }
            }
            self.packets.push(packet.to_vec());
            Ok(packet.len())
        }
    }

    fn departed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap()
    }

    fn short_flight() -> SimulationConfig {
        SimulationConfig {
            flight_seconds: 6.0,
            grace: Some(Duration::from_secs(1)),
            ..SimulationConfig::default()
        }
    }

    fn phase_code(packet: &[u8]) -> i32 {
        let at = 4 + 31 * 4;
        i32::from_be_bytes([packet[at], packet[at + 1], packet[at + 2], packet[at + 3]])
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulationConfig::default().validate().is_ok());
        let bad = SimulationConfig {
            flight_seconds: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(bad.validate(), Err(Error::Config(_))));
        let bad = SimulationConfig {
            tick: Duration::ZERO,
            ..SimulationConfig::default()
        };
        assert!(bad.validate().is_err());
        assert_eq!(SimulationConfig::default().run_limit(), None);
        assert_eq!(short_flight().run_limit(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_unrepresentable_limits_rejected() {
        let huge = SimulationConfig {
            flight_seconds: 1e20,
            grace: Some(Duration::from_secs(1)),
            ..SimulationConfig::default()
        };
        assert!(matches!(huge.validate(), Err(Error::Config(_))));
        assert_eq!(huge.run_limit(), None);

        let overflow = SimulationConfig {
            flight_seconds: 1e19,
            grace: Some(Duration::MAX),
            ..SimulationConfig::default()
        };
        assert!(overflow.validate().is_err());
        assert_eq!(overflow.run_limit(), None);
    }

    #[test]
    fn test_non_ascii_flight_number_is_fatal() {
        let config = SimulationConfig {
            flight_number: "RÇ901".to_string(),
            ..SimulationConfig::default()
        };
        let res = Simulator::new(jfk_ord(), &config, departed_at());
        assert!(matches!(res, Err(Error::Packet(PacketError::NonAscii(_)))));
    }

    #[test]
    fn test_step_scenarios() {
        let mut sim = Simulator::new(jfk_ord(), &SimulationConfig::default(), departed_at()).unwrap();

        let tick = sim.step(0.0, departed_at()).unwrap();
        assert_eq!(tick.packet.len(), 172);
        assert_eq!(tick.snapshot.phase, FlightPhase::Preflight);
        assert_eq!(tick.left_phase, None);

        let tick = sim.step(300.0, departed_at()).unwrap();
        assert_eq!(phase_code(&tick.packet), 4);
        assert_eq!(tick.left_phase, Some(FlightPhase::Preflight));

        let tick = sim.step(650.0, departed_at()).unwrap();
        assert_eq!(phase_code(&tick.packet), 8);
        assert_eq!((tick.snapshot.lat, tick.snapshot.lon), sim.route().target());
    }

    #[test]
    fn test_zero_distance_route() {
        use crate::airport::Airport;
        // Two codes sharing one set of coordinates
        let here = Airport::new("AAA", "KAAA", 40.0, -75.0, Some(1));
        let there = Airport::new("BBB", "KBBB", 40.0, -75.0, Some(2));
        let route = Route::new(here, there).unwrap();
        let mut sim = Simulator::new(route, &SimulationConfig::default(), departed_at()).unwrap();

        for elapsed in [0.0, 300.0, 650.0] {
            let tick = sim.step(elapsed, departed_at()).unwrap();
            assert_eq!(tick.packet.len(), 172, "at {}", elapsed);
            assert_eq!(tick.snapshot.distance_remaining_nm, 0, "at {}", elapsed);
            assert_eq!(tick.snapshot.heading, 0.0, "at {}", elapsed);
            assert_eq!((tick.snapshot.lat, tick.snapshot.lon), (40.0, -75.0));
        }
    }

    #[test]
    fn test_rev6_step() {
        let config = SimulationConfig {
            revision: Revision::Rev6,
            ..SimulationConfig::default()
        };
        let mut sim = Simulator::new(jfk_ord(), &config, departed_at()).unwrap();
        let tick = sim.step(100.0, departed_at()).unwrap();
        assert_eq!(tick.packet.len(), 177);
        assert_eq!(&tick.packet[172..], b"RC901");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_run_flies_every_phase() {
        let config = short_flight();
        let sim = Simulator::new(jfk_ord(), &config, departed_at()).unwrap();
        let mut broadcaster = Broadcaster::new(sim, RecordingSink::default(), &config);

        let summary = broadcaster.run(std::future::pending()).await.unwrap();
        assert_eq!(summary.final_phase, FlightPhase::Postflight);
        assert_eq!(summary.send_failures, 0);
        assert_eq!(summary.sent, summary.ticks);
        // 100ms ticks up to 7s inclusive
        assert!((69..=72).contains(&summary.ticks), "ticks {}", summary.ticks);

        let packets = &broadcaster.sink().packets;
        assert!(packets.iter().all(|p| p.len() == 172));
        let phases: Vec<i32> = packets.iter().map(|p| phase_code(p)).collect();
        assert!(phases.windows(2).all(|w| w[0] <= w[1]), "phase went back: {:?}", phases);
        for code in 1..=6 {
            assert!(phases.contains(&code), "phase {} never sent", code);
        }
        assert_eq!(phases.last(), Some(&8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failures_do_not_stop_loop() {
        let config = short_flight();
        let sim = Simulator::new(jfk_ord(), &config, departed_at()).unwrap();
        let sink = RecordingSink {
            fail_every: Some(3),
            ..RecordingSink::default()
        };
        let mut broadcaster = Broadcaster::new(sim, sink, &config);

        let summary = broadcaster.run(std::future::pending()).await.unwrap();
        assert!(summary.send_failures > 0);
        assert_eq!(summary.sent + summary.send_failures, summary.ticks);
        assert_eq!(summary.final_phase, FlightPhase::Postflight);
        assert_eq!(broadcaster.into_sink().packets.len() as u64, summary.sent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_unbounded_run() {
        let config = SimulationConfig::default();
        let sim = Simulator::new(jfk_ord(), &config, departed_at()).unwrap();
        let mut broadcaster = Broadcaster::new(sim, RecordingSink::default(), &config);

        let summary = broadcaster
            .run(tokio::time::sleep(Duration::from_millis(350)))
            .await
            .unwrap();
        assert!((3..=5).contains(&summary.ticks), "ticks {}", summary.ticks);
        assert_eq!(summary.final_phase, FlightPhase::Preflight);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_line_written() {
        let config = short_flight();
        let sim = Simulator::new(jfk_ord(), &config, departed_at()).unwrap();
        let progress = ProgressLine::new(Box::new(io::sink()) as Box<dyn io::Write>, 6.0);
        let mut broadcaster =
            Broadcaster::new(sim, RecordingSink::default(), &config).with_progress(progress);
        let summary = broadcaster.run(std::future::pending()).await.unwrap();
        assert_eq!(summary.final_phase, FlightPhase::Postflight);
    }
}
