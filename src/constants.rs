// Shared constants for the simulated flight and the telemetry feed

/// Reserved "no data" value for 32-bit fields.
pub const INVALID: i32 = 0x7FFF_FFFF;

/// Packet header: protocol magic identifier.
pub const MAGIC_ID: u16 = 0xFDFD;

/// Packet header: telemetry data packet type.
pub const DATA_PACKET_TYPE: u16 = 0x10;

/// Degrees are sent as arc-seconds.
pub const LAT_LON_SCALE_FACTOR: f64 = 3600.0;

/// Scheduled duration of the simulated flight (s).
pub const TOTAL_FLIGHT_SECONDS: f64 = 600.0;

/// Default tick period (ms).
pub const TICK_PERIOD_MS: u64 = 100;

/// Default multicast destination.
pub const MULTICAST_GROUP: &str = "224.0.0.1";
pub const MULTICAST_PORT: u16 = 50066;
pub const MULTICAST_TTL: u32 = 2;

/// Default airport reference table.
pub const AIRPORT_DATA_FILE: &str = "tbairportinfo.csv";

/// Default route.
pub const DEFAULT_DEPARTURE: &str = "JFK";
pub const DEFAULT_DESTINATION: &str = "ORD";

// --- Flight profile ---

/// Cruise altitude at the top of the half-sine profile (ft).
pub const MAX_ALTITUDE_FT: f64 = 35000.0;

/// Peak of the vertical speed cosine (fpm).
pub const VERTICAL_SPEED_PEAK_FPM: f64 = 3000.0;

/// Base true airspeed before the cosine ripple (kt).
pub const BASE_TAS_KT: f64 = 450.0;

/// Fractional TAS reduction at the ends of the flight.
pub const TAS_RIPPLE: f64 = 0.2;

/// Ground speed as a fraction of TAS.
pub const GROUND_SPEED_FACTOR: f64 = 0.95;

/// Constant headwind magnitude (kt).
pub const HEAD_WIND_KT: f64 = 39.0;

/// Wind direction relative to the aircraft heading (deg).
pub const WIND_OFFSET_DEG: f64 = 10.0;

/// Flight path angle sent in every packet.
pub const FLIGHT_PATH_ANGLE: i32 = 14;

/// Placeholder temperature used by the fixed temperature model.
pub const FIXED_TEMPERATURE: f64 = 5.0;

/// ISA sea level temperature (K) and lapse rate (K/ft, as used by the feed).
pub const ISA_SEA_LEVEL_K: f64 = 288.15;
pub const ISA_LAPSE_RATE: f64 = 0.0065;

/// Speed of sound approximation: 20.05 * sqrt(T) m/s, then to knots.
pub const SOS_COEFFICIENT: f64 = 20.05;
pub const MS_TO_KTS: f64 = 1.944;

// --- Attitude ---

/// Takeoff pitch ramps from the base to base + span over the ramp duration.
pub const TAKEOFF_PITCH_BASE: f64 = 5.0;
pub const TAKEOFF_PITCH_SPAN: f64 = 5.0;
pub const TAKEOFF_RAMP_SECONDS: f64 = 30.0;

/// Course correction roll amplitude (deg) and period divisor (s).
pub const ROLL_AMPLITUDE_DEG: f64 = 5.0;
pub const ROLL_PERIOD_DIVISOR: f64 = 10.0;

pub const MINUTES_PER_DAY: i64 = 1440;
pub const SECONDS_PER_DAY: i64 = 86400;
