// Route - departure/destination pair resolved against the airport directory

use crate::airport::{Airport, AirportDirectory};
use crate::geodesy::{self, LatLon};

/// Error type for route selection. Both variants reject the run before it starts.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("unknown airport code(s): {}", .0.join(", "))]
    UnknownAirport(Vec<String>),
    #[error("departure and destination cannot be the same ({0})")]
    SameAirport(String),
}

/// Immutable departure/destination pair for one run.
#[derive(Debug, Clone)]
pub struct Route {
    pub departure: Airport,
    pub destination: Airport,
}

impl Route {
    /// Build a route from two airports.
    pub fn new(departure: Airport, destination: Airport) -> Result<Self, RouteError> {
        if departure.iata == destination.iata {
            return Err(RouteError::SameAirport(departure.iata));
        }
        Ok(Route { departure, destination })
    }

    /// Resolve two IATA codes against the directory.
    pub fn resolve(directory: &AirportDirectory, dep: &str, dst: &str) -> Result<Self, RouteError> {
        let unknown: Vec<String> = [dep, dst]
            .iter()
            .filter(|code| !directory.contains(code))
            .map(|code| code.trim().to_uppercase())
            .collect();
        if !unknown.is_empty() {
            return Err(RouteError::UnknownAirport(unknown));
        }

        match (directory.get(dep), directory.get(dst)) {
            (Some(d), Some(a)) => Route::new(d.clone(), a.clone()),
            _ => Err(RouteError::UnknownAirport(vec![dep.to_string(), dst.to_string()])),
        }
    }

    pub fn origin(&self) -> LatLon {
        self.departure.position()
    }

    pub fn target(&self) -> LatLon {
        self.destination.position()
    }

    /// Total great-circle length of the route in nautical miles.
    pub fn distance_nm(&self) -> f64 {
        geodesy::great_circle_distance_nm(self.origin(), self.target())
    }

    /// Position after `fraction` of the route.
    pub fn position_at(&self, fraction: f64) -> LatLon {
        geodesy::interpolate_position(self.origin(), self.target(), fraction)
    }

    /// Heading at the departure end of the route.
    pub fn initial_heading(&self) -> f64 {
        geodesy::initial_bearing(self.origin(), self.target())
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.departure.iata, self.destination.iata)
    }
}
