// Airport directory loaded from the delimited reference table
//
// Expected columns (others are ignored):
//   FourLetId, ThreeLetId, Lat, Lon, PointGeoRefId

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{Airport, AirportError};

const REQUIRED_HEADERS: &[&str] = &["FourLetId", "ThreeLetId", "Lat", "Lon", "PointGeoRefId"];

/// City id spellings that mean "no city".
const NULL_CITY_IDS: &[&str] = &["NULL", "N/A", "NONE"];

/// One row as it appears in the file. Numbers stay text until validated.
#[derive(Debug, Deserialize)]
struct RawAirportRecord {
    #[serde(rename = "FourLetId")]
    four_let_id: String,
    #[serde(rename = "ThreeLetId")]
    three_let_id: String,
    #[serde(rename = "Lat")]
    lat: String,
    #[serde(rename = "Lon")]
    lon: String,
    #[serde(rename = "PointGeoRefId")]
    point_geo_ref_id: String,
}

impl RawAirportRecord {
    /// None when the coordinates don't parse or the row has no IATA code.
    fn into_airport(self) -> Option<Airport> {
        if self.three_let_id.trim().is_empty() {
            return None;
        }
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Some(Airport::new(
            &self.three_let_id,
            &self.four_let_id,
            lat,
            lon,
            parse_city_ref(&self.point_geo_ref_id),
        ))
    }
}

fn parse_city_ref(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() || NULL_CITY_IDS.iter().any(|n| s.eq_ignore_ascii_case(n)) {
        return None;
    }
    s.parse::<i32>().ok()
}

/// Read-only IATA code lookup of airports.
#[derive(Debug, Default)]
pub struct AirportDirectory {
    airports: HashMap<String, Airport>,
}

impl AirportDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the directory from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AirportError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AirportError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let directory = Self::from_reader(file)?;
        debug!("Loaded {} airports from {}", directory.len(), path.display());
        Ok(directory)
    }

    /// Load the directory from any CSV source.
    ///
    /// Missing required headers are an error. Rows with unusable coordinates
    /// are skipped with a warning, a later row with the same IATA code wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AirportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let missing: Vec<&'static str> = REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|h| !headers.iter().any(|field| field == *h))
            .collect();
        if !missing.is_empty() {
            return Err(AirportError::MissingHeaders {
                missing,
                required: REQUIRED_HEADERS,
            });
        }

        let mut directory = AirportDirectory::new();
        for (row, res) in csv_reader.deserialize::<RawAirportRecord>().enumerate() {
            match res {
                Ok(raw) => match raw.into_airport() {
                    Some(airport) => directory.insert(airport),
                    None => warn!("Skipping airport row {}: unusable code or coordinates", row + 1),
                },
                Err(e) => warn!("Skipping airport row {}: {}", row + 1, e),
            }
        }
        Ok(directory)
    }

    pub fn insert(&mut self, airport: Airport) {
        self.airports.insert(airport.iata.clone(), airport);
    }

    /// Look up an airport by IATA code (case-insensitive).
    pub fn get(&self, iata: &str) -> Option<&Airport> {
        self.airports.get(&iata.trim().to_uppercase())
    }

    pub fn contains(&self, iata: &str) -> bool {
        self.get(iata).is_some()
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}
