// Airport reference data
// Airports are keyed by three-letter IATA code and carry the ICAO code,
// coordinates and the receiver's city reference id.

mod directory;

pub use directory::AirportDirectory;

use std::path::PathBuf;

use crate::constants::INVALID;
use crate::geodesy::LatLon;

/// Error type for loading the airport directory.
#[derive(Debug, thiserror::Error)]
pub enum AirportError {
    #[error("airport file not found: {0}")]
    NotFound(PathBuf),
    #[error("airport file is missing required headers {missing:?} (required: {required:?})")]
    MissingHeaders {
        missing: Vec<&'static str>,
        required: &'static [&'static str],
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One airport of the reference table. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    pub iata: String,
    pub icao: String,
    pub lat: f64,
    pub lon: f64,
    /// City reference id, or `INVALID` when the table has none.
    pub city_ref_id: i32,
}

impl Airport {
    pub fn new(iata: &str, icao: &str, lat: f64, lon: f64, city_ref_id: Option<i32>) -> Self {
        Airport {
            iata: iata.trim().to_uppercase(),
            icao: icao.trim().to_uppercase(),
            lat,
            lon,
            city_ref_id: city_ref_id.unwrap_or(INVALID),
        }
    }

    pub fn position(&self) -> LatLon {
        (self.lat, self.lon)
    }

    pub fn has_city_ref(&self) -> bool {
        self.city_ref_id != INVALID
    }
}

impl std::fmt::Display for Airport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({:.4}, {:.4})", self.iata, self.icao, self.lat, self.lon)
    }
}
