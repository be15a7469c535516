// Telemetry derivation - all flight-dynamics values for one tick
//
// Everything here is a pure function of the route, the simulation state and
// the wall clock; nothing is carried from one tick to the next.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::constants::*;
use crate::phase::{FlightPhase, PhaseSchedule, SimulationState};
use crate::route::Route;

/// Temperature model feeding the speed-of-sound approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TemperatureModel {
    /// Constant placeholder temperature
    Fixed,
    /// ISA lapse rate from sea level (K)
    Isa,
}

impl TemperatureModel {
    pub fn temperature(self, altitude_ft: f64) -> f64 {
        match self {
            TemperatureModel::Fixed => FIXED_TEMPERATURE,
            TemperatureModel::Isa => ISA_SEA_LEVEL_K - ISA_LAPSE_RATE * altitude_ft,
        }
    }
}

/// Knobs that differ between receiver revisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivationProfile {
    pub temperature_model: TemperatureModel,
    /// Mach is sent as `mach * mach_scale`
    pub mach_scale: f64,
    /// Sinusoidal course-correction roll during Climb and Descent
    pub roll_oscillation: bool,
}

/// Wall-clock inputs of one tick.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    pub now: DateTime<Utc>,
    pub departed_at: DateTime<Utc>,
}

/// Every derived value of one tick. Computed fresh, never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub elapsed_seconds: f64,
    pub phase: FlightPhase,
    pub fraction: f64,
    pub lat: f64,
    pub lon: f64,
    pub heading: f64,

    pub altitude_ft: f64,
    pub vertical_speed_fpm: i32,
    pub true_airspeed_kt: f64,
    pub ground_speed_kt: i32,
    pub temperature: f64,
    pub speed_of_sound_kt: f64,
    /// Scaled by the profile's `mach_scale`, or `INVALID`
    pub mach: i32,

    pub head_wind_kt: i32,
    pub wind_direction: f64,
    pub tailwind_kt: i32,
    pub flight_path_angle: i32,

    pub total_distance_nm: f64,
    pub distance_traveled_nm: f64,
    pub distance_remaining_nm: i32,
    pub remaining_seconds: f64,

    pub pitch_deg: i32,
    pub roll_deg: i32,

    /// `year << 16 | month << 8 | day` of the current UTC date
    pub date_enc: u32,
    pub seconds_of_day: i32,
    pub epoch_seconds: i64,
    /// Minutes after UTC midnight at which the flight is due, wrapped to one day
    pub eta_minutes_of_day: i32,
}

/// Truncate a derived value to a 32-bit field; NaN, infinities and
/// out-of-range values become `INVALID`.
pub fn int_field(value: f64) -> i32 {
    if value.is_finite() && value >= i32::MIN as f64 && value < i32::MAX as f64 {
        value as i32
    } else {
        INVALID
    }
}

/// Half-sine altitude profile (ft), zero once the route is complete
pub fn altitude_ft(fraction: f64) -> f64 {
    if fraction < 1.0 {
        MAX_ALTITUDE_FT * (std::f64::consts::PI * fraction).sin()
    } else {
        0.0
    }
}

/// Cosine-shaped vertical speed (fpm).
///
/// This is a visual approximation for the feed, not the derivative of
/// [`altitude_ft`]; receivers expect exactly this shape.
pub fn vertical_speed_fpm(fraction: f64) -> i32 {
    if fraction < 1.0 {
        int_field(VERTICAL_SPEED_PEAK_FPM * (std::f64::consts::PI * fraction).cos())
    } else {
        0
    }
}

pub fn true_airspeed_kt(fraction: f64) -> f64 {
    BASE_TAS_KT * (1.0 - (std::f64::consts::PI * fraction).cos().abs() * TAS_RIPPLE)
}

pub fn speed_of_sound_kt(temperature: f64) -> f64 {
    SOS_COEFFICIENT * temperature.sqrt() * MS_TO_KTS
}

/// Scaled Mach number; a degenerate speed of sound yields `INVALID`.
pub fn mach(tas_kt: f64, speed_of_sound_kt: f64, scale: f64) -> i32 {
    if !(speed_of_sound_kt.is_finite() && speed_of_sound_kt > 0.0) {
        return INVALID;
    }
    int_field(tas_kt / speed_of_sound_kt * scale)
}

/// Tail/headwind component for a wind blowing from `heading + WIND_OFFSET_DEG`.
pub fn tailwind_kt(heading: f64) -> i32 {
    let wind_direction = heading + WIND_OFFSET_DEG;
    int_field(HEAD_WIND_KT * (heading - wind_direction).to_radians().cos())
}

/// Pitch by phase. Takeoff ramps from 5 to 10 degrees across the takeoff ramp,
/// measured from the moment Takeoff begins.
///
/// A ramp clamped from departure instead would already read 10 for all of Takeoff.
pub fn pitch_deg(phase: FlightPhase, elapsed: f64, schedule: &PhaseSchedule) -> i32 {
    match phase {
        FlightPhase::Takeoff => {
            let ramp = TAKEOFF_RAMP_SECONDS * schedule.scale();
            let in_phase = (elapsed - schedule.phase_start(FlightPhase::Takeoff)).clamp(0.0, ramp);
            let progress = if ramp > 0.0 { in_phase / ramp } else { 1.0 };
            int_field(TAKEOFF_PITCH_BASE + TAKEOFF_PITCH_SPAN * progress)
        }
        FlightPhase::Climb => 5,
        FlightPhase::Cruise => 0,
        FlightPhase::Descent => -2,
        FlightPhase::Approach => 2,
        FlightPhase::Landing => 5, // flare
        FlightPhase::Preflight | FlightPhase::Postflight => 0,
    }
}

pub fn roll_deg(phase: FlightPhase, elapsed: f64, oscillation: bool) -> i32 {
    match phase {
        FlightPhase::Climb | FlightPhase::Descent if oscillation => {
            int_field(ROLL_AMPLITUDE_DEG * (elapsed / ROLL_PERIOD_DIVISOR).sin())
        }
        _ => 0,
    }
}

/// Packed `u16 year | u8 month | u8 day`, as a big-endian u32.
pub fn encode_date(now: &DateTime<Utc>) -> u32 {
    ((now.year() as u32 & 0xFFFF) << 16) | (now.month() << 8) | now.day()
}

pub fn seconds_of_day(now: &DateTime<Utc>) -> i32 {
    (now.num_seconds_from_midnight() as i64 % SECONDS_PER_DAY) as i32
}

/// Departure minute-of-day plus the scheduled flight time, modulo one day.
pub fn eta_minutes_of_day(departed_at: &DateTime<Utc>, total_seconds: f64) -> i32 {
    let departure_minutes = (departed_at.hour() * 60 + departed_at.minute()) as f64;
    let eta = (departure_minutes + total_seconds / 60.0).rem_euclid(MINUTES_PER_DAY as f64);
    int_field(eta)
}

impl TelemetrySnapshot {
    /// Derive the snapshot for the current simulation instant.
    pub fn derive(
        route: &Route,
        state: &SimulationState,
        schedule: &PhaseSchedule,
        profile: &DerivationProfile,
        clock: &WallClock,
    ) -> Self {
        let elapsed = state.elapsed_seconds();
        let phase = state.phase();
        let fraction = schedule.fraction(elapsed);
        let heading = state.heading();
        let (lat, lon) = state.position();

        let altitude = altitude_ft(fraction);
        let tas = true_airspeed_kt(fraction);
        let temperature = profile.temperature_model.temperature(altitude);
        let sos = speed_of_sound_kt(temperature);

        let total_nm = route.distance_nm();
        let traveled_nm = total_nm * fraction;

        TelemetrySnapshot {
            elapsed_seconds: elapsed,
            phase,
            fraction,
            lat,
            lon,
            heading,

            altitude_ft: altitude,
            vertical_speed_fpm: vertical_speed_fpm(fraction),
            true_airspeed_kt: tas,
            ground_speed_kt: int_field(tas * GROUND_SPEED_FACTOR),
            temperature,
            speed_of_sound_kt: sos,
            mach: mach(tas, sos, profile.mach_scale),

            head_wind_kt: HEAD_WIND_KT as i32,
            wind_direction: heading + WIND_OFFSET_DEG,
            tailwind_kt: tailwind_kt(heading),
            flight_path_angle: FLIGHT_PATH_ANGLE,

            total_distance_nm: total_nm,
            distance_traveled_nm: traveled_nm,
            distance_remaining_nm: int_field(total_nm - traveled_nm),
            remaining_seconds: (schedule.total_seconds() - elapsed).max(0.0),

            pitch_deg: pitch_deg(phase, elapsed, schedule),
            roll_deg: roll_deg(phase, elapsed, profile.roll_oscillation),

            date_enc: encode_date(&clock.now),
            seconds_of_day: seconds_of_day(&clock.now),
            epoch_seconds: clock.now.timestamp(),
            eta_minutes_of_day: eta_minutes_of_day(&clock.departed_at, schedule.total_seconds()),
        }
    }
}
