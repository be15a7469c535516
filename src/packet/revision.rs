// Protocol revisions understood by the display receiver
//
// The revisions are NOT binary compatible: they differ in field order,
// scaling, clock encodings and the byte order of packed airport codes.
// Each one is its own field table; nothing is shared between them except
// the generic encoder.
//
//   rev7 (canonical)  >2H 20i I 21i          172 bytes
//   rev6              >2H 42i 5s             177 bytes

use super::ascii::ByteOrder;
use super::layout::{FieldKind, FieldSpec, FieldValue, Layout};
use super::PacketError;
use crate::constants::{DATA_PACKET_TYPE, LAT_LON_SCALE_FACTOR, MAGIC_ID};
use crate::route::Route;
use crate::telemetry::{int_field, DerivationProfile, TelemetrySnapshot, TemperatureModel};

/// Everything a field source can read: the tick's snapshot plus static identifiers.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub snapshot: &'a TelemetrySnapshot,
    pub route: &'a Route,
    pub flight_number: &'a str,
}

/// Protocol revision tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Revision {
    #[default]
    Rev7,
    Rev6,
}

impl Revision {
    pub fn name(self) -> &'static str {
        match self {
            Revision::Rev7 => "rev7",
            Revision::Rev6 => "rev6",
        }
    }

    /// The revision's validated field table.
    pub fn layout(self) -> Result<Layout, PacketError> {
        match self {
            Revision::Rev7 => Layout::new("rev7", REV7_FIELD_COUNT, &REV7_FIELDS),
            Revision::Rev6 => Layout::new("rev6", REV6_FIELD_COUNT, &REV6_FIELDS),
        }
    }

    /// Packet size the receiver expects
    pub fn expected_size(self) -> usize {
        match self {
            Revision::Rev7 => REV7_PACKET_SIZE,
            Revision::Rev6 => REV6_PACKET_SIZE,
        }
    }

    pub fn default_temperature_model(self) -> TemperatureModel {
        match self {
            Revision::Rev7 => TemperatureModel::Fixed,
            Revision::Rev6 => TemperatureModel::Isa,
        }
    }

    /// Derivation settings for this revision, optionally with another temperature model.
    pub fn profile(self, temperature: Option<TemperatureModel>) -> DerivationProfile {
        let temperature_model = temperature.unwrap_or(self.default_temperature_model());
        match self {
            Revision::Rev7 => DerivationProfile {
                temperature_model,
                mach_scale: 1000.0,
                roll_oscillation: false,
            },
            Revision::Rev6 => DerivationProfile {
                temperature_model,
                mach_scale: 10000.0,
                roll_oscillation: true,
            },
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn int(v: i32) -> FieldValue {
    FieldValue::from(v)
}

#[inline]
fn real(v: f64) -> FieldValue {
    FieldValue::from(int_field(v))
}

#[inline]
fn arcsec(deg: f64) -> FieldValue {
    real(deg * LAT_LON_SCALE_FACTOR)
}

const HEADER_MAGIC: FieldSpec =
    FieldSpec::new("magic_id", FieldKind::U16, |_| FieldValue::Int(MAGIC_ID as i64));
const HEADER_TYPE: FieldSpec =
    FieldSpec::new("packet_type", FieldKind::U16, |_| FieldValue::Int(DATA_PACKET_TYPE as i64));

// --- rev7 ---

pub const REV7_FIELD_COUNT: usize = 2 + 42;
pub const REV7_PACKET_SIZE: usize = 2 * 2 + 42 * 4;

const REV7_CODES: FieldKind = FieldKind::PackedAscii(ByteOrder::Little);

static REV7_FIELDS: [FieldSpec; REV7_FIELD_COUNT] = [
    HEADER_MAGIC,
    HEADER_TYPE,
    FieldSpec::i32("valid_flag", |_| int(1)),
    FieldSpec::i32("lat", |f| arcsec(f.snapshot.lat)),
    FieldSpec::i32("lon", |f| arcsec(f.snapshot.lon)),
    FieldSpec::i32("ground_speed", |f| int(f.snapshot.ground_speed_kt)),
    FieldSpec::i32("true_airspeed", |f| real(f.snapshot.true_airspeed_kt)),
    FieldSpec::i32("flight_path_angle", |f| int(f.snapshot.flight_path_angle)),
    FieldSpec::i32("head_wind", |f| int(f.snapshot.head_wind_kt)),
    FieldSpec::i32("distance_to_destination", |f| int(f.snapshot.distance_remaining_nm)),
    FieldSpec::i32("distance_from_departure", |f| real(f.snapshot.distance_traveled_nm)),
    FieldSpec::i32("altitude", |f| real(f.snapshot.altitude_ft)),
    FieldSpec::i32("temperature", |f| real(f.snapshot.temperature)),
    FieldSpec::i32("remaining_minutes", |f| real(f.snapshot.remaining_seconds / 60.0)),
    FieldSpec::i32("minutes_since_departure", |f| real(f.snapshot.elapsed_seconds / 60.0)),
    FieldSpec::i32("heading", |f| real(f.snapshot.heading)),
    FieldSpec::i32("heading_to_destination", |f| real(f.snapshot.heading)),
    FieldSpec::i32("tailwind", |f| int(f.snapshot.tailwind_kt)),
    FieldSpec::i32("eta_minutes_of_day", |f| int(f.snapshot.eta_minutes_of_day)),
    FieldSpec::i32("mach", |f| int(f.snapshot.mach)),
    FieldSpec::i32("distance_traveled_scaled", |f| real(f.snapshot.distance_traveled_nm * 100.0)),
    FieldSpec::i32("seconds_of_day", |f| int(f.snapshot.seconds_of_day)),
    FieldSpec::new("date", FieldKind::U32, |f| FieldValue::from(f.snapshot.date_enc)),
    FieldSpec::i32("dep_lat", |f| arcsec(f.route.departure.lat)),
    FieldSpec::i32("dep_lon", |f| arcsec(f.route.departure.lon)),
    FieldSpec::new("dep_iata", REV7_CODES, |f| f.route.departure.iata.as_str().into()),
    FieldSpec::new("dep_icao", REV7_CODES, |f| f.route.departure.icao.as_str().into()),
    FieldSpec::i32("dep_city_id", |f| int(f.route.departure.city_ref_id)),
    FieldSpec::i32("dst_lat", |f| arcsec(f.route.destination.lat)),
    FieldSpec::i32("dst_lon", |f| arcsec(f.route.destination.lon)),
    FieldSpec::new("dst_iata", REV7_CODES, |f| f.route.destination.iata.as_str().into()),
    FieldSpec::new("dst_icao", REV7_CODES, |f| f.route.destination.icao.as_str().into()),
    FieldSpec::i32("dst_city_id", |f| int(f.route.destination.city_ref_id)),
    FieldSpec::i32("phase", |f| int(f.snapshot.phase.code() as i32)),
    FieldSpec::i32("acars_phase_id", |_| int(1)),
    FieldSpec::i32("miqat_phase", |_| int(1)),
    // Receiver takes attitude from pitch/roll below
    FieldSpec::i32("attitude_combined", |_| int(0)),
    // Receiver fails on anything but 0
    FieldSpec::i32("end_of_flight", |_| int(0)),
    // Must stay above 0
    FieldSpec::i32("display_enable", |_| int(1)),
    FieldSpec::i32("profile_mode", |_| int(1)),
    FieldSpec::i32("altitude_scaled", |f| real(f.snapshot.altitude_ft * 100.0)),
    FieldSpec::i32("vertical_speed", |f| int(f.snapshot.vertical_speed_fpm)),
    FieldSpec::i32("pitch", |f| int(f.snapshot.pitch_deg)),
    FieldSpec::i32("roll", |f| int(f.snapshot.roll_deg)),
];

// --- rev6 ---

pub const REV6_FIELD_COUNT: usize = 2 + 42 + 1;
pub const REV6_FLIGHT_ID_WIDTH: usize = 5;
pub const REV6_PACKET_SIZE: usize = 2 * 2 + 42 * 4 + REV6_FLIGHT_ID_WIDTH;

const REV6_CODES: FieldKind = FieldKind::PackedAscii(ByteOrder::Big);

static REV6_FIELDS: [FieldSpec; REV6_FIELD_COUNT] = [
    HEADER_MAGIC,
    HEADER_TYPE,
    FieldSpec::i32("valid_flag", |_| int(1)),
    FieldSpec::i32("lat", |f| arcsec(f.snapshot.lat)),
    FieldSpec::i32("lon", |f| arcsec(f.snapshot.lon)),
    FieldSpec::i32("ground_speed", |f| int(f.snapshot.ground_speed_kt)),
    FieldSpec::i32("true_airspeed", |f| real(f.snapshot.true_airspeed_kt)),
    FieldSpec::i32("flight_path_angle", |f| int(f.snapshot.flight_path_angle)),
    FieldSpec::i32("head_wind", |f| int(f.snapshot.head_wind_kt)),
    FieldSpec::i32("distance_to_destination", |f| int(f.snapshot.distance_remaining_nm)),
    FieldSpec::i32("unknown_8", |_| int(4)),
    FieldSpec::i32("altitude_scaled", |f| real(f.snapshot.altitude_ft * 100.0)),
    FieldSpec::i32("temperature", |f| real(f.snapshot.temperature)),
    FieldSpec::i32("remaining_seconds", |f| real(f.snapshot.remaining_seconds)),
    FieldSpec::i32("seconds_since_departure", |f| real(f.snapshot.elapsed_seconds)),
    FieldSpec::i32("heading", |f| real(f.snapshot.heading)),
    FieldSpec::i32("vertical_speed_scaled", |f| {
        FieldValue::Int(f.snapshot.vertical_speed_fpm as i64 * 100)
    }),
    FieldSpec::i32("tailwind", |f| int(f.snapshot.tailwind_kt)),
    FieldSpec::i32("eta_epoch", |f| {
        FieldValue::Int(f.snapshot.epoch_seconds + f.snapshot.remaining_seconds as i64)
    }),
    FieldSpec::i32("mach", |f| int(f.snapshot.mach)),
    FieldSpec::i32("distance_traveled_scaled", |f| real(f.snapshot.distance_traveled_nm * 100.0)),
    FieldSpec::i32("epoch_time", |f| FieldValue::Int(f.snapshot.epoch_seconds)),
    FieldSpec::i32("date", |f| FieldValue::from(f.snapshot.date_enc)),
    FieldSpec::i32("dep_lat", |f| arcsec(f.route.departure.lat)),
    FieldSpec::i32("dep_lon", |f| arcsec(f.route.departure.lon)),
    FieldSpec::new("dep_iata", REV6_CODES, |f| f.route.departure.iata.as_str().into()),
    FieldSpec::new("dep_icao", REV6_CODES, |f| f.route.departure.icao.as_str().into()),
    FieldSpec::i32("dep_city_id", |f| int(f.route.departure.city_ref_id)),
    FieldSpec::i32("dst_lat", |f| arcsec(f.route.destination.lat)),
    FieldSpec::i32("dst_lon", |f| arcsec(f.route.destination.lon)),
    FieldSpec::new("dst_iata", REV6_CODES, |f| f.route.destination.iata.as_str().into()),
    FieldSpec::new("dst_icao", REV6_CODES, |f| f.route.destination.icao.as_str().into()),
    FieldSpec::i32("dst_city_id", |f| int(f.route.destination.city_ref_id)),
    FieldSpec::i32("phase", |f| int(f.snapshot.phase.code() as i32)),
    FieldSpec::i32("unknown_32", |_| int(1)),
    // Receiver fails on anything but 0
    FieldSpec::i32("reserved_33", |_| int(0)),
    FieldSpec::i32("attitude_combined", |_| int(0)),
    FieldSpec::i32("end_of_flight", |_| int(0)),
    // Must stay above 0
    FieldSpec::i32("display_enable", |_| int(4)),
    FieldSpec::i32("unknown_37", |_| int(2)),
    FieldSpec::i32("unknown_38", |_| int(2)),
    FieldSpec::i32("vertical_speed", |f| int(f.snapshot.vertical_speed_fpm)),
    FieldSpec::i32("pitch", |f| int(f.snapshot.pitch_deg)),
    FieldSpec::i32("roll", |f| int(f.snapshot.roll_deg)),
    FieldSpec::new("flight_id", FieldKind::Ascii(REV6_FLIGHT_ID_WIDTH), |f| f.flight_number.into()),
];
