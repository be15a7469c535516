// Flight phase state machine and per-run simulation state
//
// The phase is a pure function of elapsed time: the code of the last schedule
// threshold already reached, forced to Postflight once the scheduled flight
// time is used up. The state only ever moves forward.

use crate::constants::TOTAL_FLIGHT_SECONDS;
use crate::geodesy::{self, LatLon};
use crate::route::Route;

/// The eight flight lifecycle stages broadcast to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FlightPhase {
    Preflight = 1,
    Takeoff = 2,
    Climb = 3,
    Cruise = 4,
    Descent = 5,
    Approach = 6,
    Landing = 7,
    Postflight = 8,
}

impl FlightPhase {
    pub const ALL: [FlightPhase; 8] = [
        FlightPhase::Preflight,
        FlightPhase::Takeoff,
        FlightPhase::Climb,
        FlightPhase::Cruise,
        FlightPhase::Descent,
        FlightPhase::Approach,
        FlightPhase::Landing,
        FlightPhase::Postflight,
    ];

    /// Wire code, 1..=8
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get((code as usize).checked_sub(1)?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            FlightPhase::Preflight => "Preflight",
            FlightPhase::Takeoff => "Takeoff",
            FlightPhase::Climb => "Climb",
            FlightPhase::Cruise => "Cruise",
            FlightPhase::Descent => "Descent",
            FlightPhase::Approach => "Approach",
            FlightPhase::Landing => "Landing",
            FlightPhase::Postflight => "Postflight/Taxi",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == FlightPhase::Postflight
    }
}

impl std::fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

/// Phase thresholds for the nominal 600 s flight, ascending.
const NOMINAL_SCHEDULE: [(f64, FlightPhase); 6] = [
    (30.0, FlightPhase::Takeoff),
    (60.0, FlightPhase::Climb),
    (180.0, FlightPhase::Cruise),
    (480.0, FlightPhase::Descent),
    (540.0, FlightPhase::Approach),
    (600.0, FlightPhase::Landing),
];

/// Ordered `(elapsed threshold, phase)` table plus the total flight duration.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSchedule {
    thresholds: Vec<(f64, FlightPhase)>,
    total_seconds: f64,
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self::scaled(TOTAL_FLIGHT_SECONDS)
    }
}

impl PhaseSchedule {
    /// The nominal schedule stretched to a flight of `total_seconds`.
    pub fn scaled(total_seconds: f64) -> Self {
        let factor = total_seconds / TOTAL_FLIGHT_SECONDS;
        PhaseSchedule {
            thresholds: NOMINAL_SCHEDULE
                .iter()
                .map(|&(t, phase)| (t * factor, phase))
                .collect(),
            total_seconds,
        }
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_seconds
    }

    /// Stretch factor relative to the nominal flight
    pub fn scale(&self) -> f64 {
        self.total_seconds / TOTAL_FLIGHT_SECONDS
    }

    pub fn thresholds(&self) -> &[(f64, FlightPhase)] {
        &self.thresholds
    }

    /// Fraction of the route completed, clamped to [0, 1]
    pub fn fraction(&self, elapsed: f64) -> f64 {
        if self.total_seconds <= 0.0 {
            return 1.0;
        }
        (elapsed / self.total_seconds).clamp(0.0, 1.0)
    }

    /// Phase for an elapsed time, ignoring history.
    pub fn phase_at(&self, elapsed: f64) -> FlightPhase {
        if self.fraction(elapsed) >= 1.0 {
            return FlightPhase::Postflight;
        }
        self.thresholds
            .iter()
            .take_while(|(t, _)| elapsed >= *t)
            .last()
            .map(|&(_, phase)| phase)
            .unwrap_or(FlightPhase::Preflight)
    }

    /// Elapsed time at which `phase` begins.
    pub fn phase_start(&self, phase: FlightPhase) -> f64 {
        match phase {
            FlightPhase::Preflight => 0.0,
            FlightPhase::Postflight => self.total_seconds,
            _ => self
                .thresholds
                .iter()
                .find(|(_, p)| *p == phase)
                .map(|&(t, _)| t)
                .unwrap_or(0.0),
        }
    }
}

/// Mutable simulation state owned by the broadcast loop.
#[derive(Debug, Clone)]
pub struct SimulationState {
    elapsed_seconds: f64,
    phase: FlightPhase,
    last_known_heading: f64,
    position: LatLon,
}

impl SimulationState {
    /// Preflight at elapsed 0, parked at the departure, facing the destination
    pub fn new(route: &Route) -> Self {
        SimulationState {
            elapsed_seconds: 0.0,
            phase: FlightPhase::Preflight,
            last_known_heading: route.initial_heading(),
            position: route.origin(),
        }
    }

    /// Move the simulation to `elapsed` seconds.
    ///
    /// Returns the previous phase when this call changed it. Elapsed time and
    /// phase never go backwards; a smaller `elapsed` is ignored.
    pub fn advance(&mut self, elapsed: f64, route: &Route, schedule: &PhaseSchedule) -> Option<FlightPhase> {
        let elapsed = elapsed.max(self.elapsed_seconds);
        self.elapsed_seconds = elapsed;

        let previous = self.phase;
        self.phase = self.phase.max(schedule.phase_at(elapsed));

        if self.phase.is_terminal() {
            // Pinned exactly to the destination; heading stays frozen
            self.position = route.target();
        } else {
            self.position = route.position_at(schedule.fraction(elapsed));
            self.last_known_heading = geodesy::initial_bearing(self.position, route.target());
        }

        (previous != self.phase).then_some(previous)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    /// Current heading: the bearing to the destination, or the frozen value in Postflight.
    pub fn heading(&self) -> f64 {
        self.last_known_heading
    }

    pub fn position(&self) -> LatLon {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::tests::jfk_ord;

    #[test]
    fn test_phase_codes() {
        for (i, phase) in FlightPhase::ALL.iter().enumerate() {
            assert_eq!(phase.code() as usize, i + 1);
            assert_eq!(FlightPhase::from_code(phase.code()), Some(*phase));
        }
        assert_eq!(FlightPhase::from_code(0), None);
        assert_eq!(FlightPhase::from_code(9), None);
        assert_eq!(FlightPhase::Cruise.to_string(), "4 (Cruise)");
    }

    #[test]
    fn test_nominal_schedule_breakpoints() {
        let s = PhaseSchedule::default();
        let cases = [
            (0.0, 1),
            (29.9, 1),
            (30.0, 2),
            (59.0, 2),
            (60.0, 3),
            (179.0, 3),
            (180.0, 4),
            (300.0, 4),
            (480.0, 5),
            (540.0, 6),
            (599.9, 6),
            (600.0, 8),
            (650.0, 8),
        ];
        for (elapsed, code) in cases {
            assert_eq!(s.phase_at(elapsed).code(), code, "elapsed {}", elapsed);
        }
    }

    #[test]
    fn test_scaled_schedule() {
        let s = PhaseSchedule::scaled(60.0);
        assert_eq!(s.phase_at(2.9), FlightPhase::Preflight);
        assert_eq!(s.phase_at(3.0), FlightPhase::Takeoff);
        assert_eq!(s.phase_at(30.0), FlightPhase::Cruise);
        assert_eq!(s.phase_at(59.0), FlightPhase::Approach);
        assert_eq!(s.phase_at(60.0), FlightPhase::Postflight);
        assert!((s.phase_start(FlightPhase::Descent) - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_fraction_clamped() {
        let s = PhaseSchedule::default();
        assert_eq!(s.fraction(-5.0), 0.0);
        assert_eq!(s.fraction(300.0), 0.5);
        assert_eq!(s.fraction(1200.0), 1.0);
    }

    #[test]
    fn test_phase_monotonic() {
        let route = jfk_ord();
        let schedule = PhaseSchedule::default();
        let mut state = SimulationState::new(&route);
        let mut last = state.phase();
        let mut t = 0.0;
        while t < 700.0 {
            state.advance(t, &route, &schedule);
            assert!(state.phase() >= last, "phase went back at {}", t);
            last = state.phase();
            t += 0.7;
        }
        assert_eq!(last, FlightPhase::Postflight);
    }

    #[test]
    fn test_no_backward_transition() {
        let route = jfk_ord();
        let schedule = PhaseSchedule::default();
        let mut state = SimulationState::new(&route);
        state.advance(500.0, &route, &schedule);
        assert_eq!(state.phase(), FlightPhase::Descent);
        state.advance(100.0, &route, &schedule);
        assert_eq!(state.phase(), FlightPhase::Descent);
        assert_eq!(state.elapsed_seconds(), 500.0);
    }

    #[test]
    fn test_advance_reports_transitions() {
        let route = jfk_ord();
        let schedule = PhaseSchedule::default();
        let mut state = SimulationState::new(&route);
        assert_eq!(state.advance(10.0, &route, &schedule), None);
        assert_eq!(state.advance(31.0, &route, &schedule), Some(FlightPhase::Preflight));
        assert_eq!(state.advance(32.0, &route, &schedule), None);
        // Skipping several phases in one step reports only the one left
        assert_eq!(state.advance(500.0, &route, &schedule), Some(FlightPhase::Takeoff));
        assert_eq!(state.phase(), FlightPhase::Descent);
    }

    #[test]
    fn test_start_at_departure() {
        let route = jfk_ord();
        let mut state = SimulationState::new(&route);
        state.advance(0.0, &route, &PhaseSchedule::default());
        assert_eq!(state.phase(), FlightPhase::Preflight);
        let (lat, lon) = state.position();
        assert!((lat - route.departure.lat).abs() < 1e-9);
        assert!((lon - route.departure.lon).abs() < 1e-9);
    }

    #[test]
    fn test_postflight_pins_destination() {
        let route = jfk_ord();
        let mut state = SimulationState::new(&route);
        state.advance(650.0, &route, &PhaseSchedule::default());
        assert_eq!(state.phase(), FlightPhase::Postflight);
        assert_eq!(state.position(), (route.destination.lat, route.destination.lon));
    }

    #[test]
    fn test_heading_frozen_in_postflight() {
        let route = jfk_ord();
        let schedule = PhaseSchedule::default();
        let mut state = SimulationState::new(&route);

        state.advance(599.9, &route, &schedule);
        assert_eq!(state.phase(), FlightPhase::Approach);
        let held = state.heading();

        for t in [600.0, 610.0, 650.0, 900.0] {
            state.advance(t, &route, &schedule);
            assert_eq!(state.phase(), FlightPhase::Postflight);
            assert_eq!(state.heading(), held);
        }
    }

    #[test]
    fn test_heading_updates_before_postflight() {
        let route = jfk_ord();
        let schedule = PhaseSchedule::default();
        let mut state = SimulationState::new(&route);
        state.advance(10.0, &route, &schedule);
        let early = state.heading();
        state.advance(500.0, &route, &schedule);
        // The great circle to ORD curves, so the bearing changes en route
        assert!((early - state.heading()).abs() > 1e-3);
    }

    #[test]
    fn test_heading_when_starting_past_end() {
        let route = jfk_ord();
        let mut state = SimulationState::new(&route);
        state.advance(650.0, &route, &PhaseSchedule::default());
        assert_eq!(state.heading(), route.initial_heading());
    }
}
