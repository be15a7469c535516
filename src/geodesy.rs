// Geodesy module - great-circle navigation on a spherical Earth
//
// Provides:
// - great-circle (slerp) interpolation between two lat/lon points
// - initial great-circle bearing
// - haversine distance in nautical miles
//
// All points are (latitude, longitude) in degrees.

use std::f64::consts::PI;

/// Degrees to radians conversion factor
const DTOR: f64 = PI / 180.0;

/// Radians to degrees conversion factor
const RTOD: f64 = 180.0 / PI;

/// Mean Earth radius in kilometres
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres to nautical miles
const KM_TO_NM: f64 = 0.539957;

/// Latitude and longitude in degrees
pub type LatLon = (f64, f64);

/// Unit vector on the sphere for a lat/lon point
#[inline]
fn to_unit_vector(p: LatLon) -> (f64, f64, f64) {
    let lat = p.0 * DTOR;
    let lon = p.1 * DTOR;
    let clat = lat.cos();
    (clat * lon.cos(), clat * lon.sin(), lat.sin())
}

/// Back from a (not necessarily unit) vector to lat/lon in degrees
#[inline]
fn from_vector(v: (f64, f64, f64)) -> LatLon {
    let (x, y, z) = v;
    (z.atan2((x * x + y * y).sqrt()) * RTOD, y.atan2(x) * RTOD)
}

/// Position along the great circle from `p1` to `p2` after `fraction` of the route.
///
/// Spherical linear interpolation of the two endpoint unit vectors by their
/// central angle. Identical endpoints return `p1` unchanged.
///
/// # Example
/// ```
/// use flightfeed::geodesy::interpolate_position;
/// let mid = interpolate_position((0.0, 0.0), (0.0, 90.0), 0.5);
/// assert!((mid.1 - 45.0).abs() < 1e-9);
/// ```
pub fn interpolate_position(p1: LatLon, p2: LatLon, fraction: f64) -> LatLon {
    if p1 == p2 {
        return p1;
    }
    let (x1, y1, z1) = to_unit_vector(p1);
    let (x2, y2, z2) = to_unit_vector(p2);

    let dot = (x1 * x2 + y1 * y2 + z1 * z2).clamp(-1.0, 1.0);
    let omega = dot.acos();
    if omega == 0.0 {
        return p1;
    }

    let sin_omega = omega.sin();
    let t1 = ((1.0 - fraction) * omega).sin() / sin_omega;
    let t2 = (fraction * omega).sin() / sin_omega;

    from_vector((t1 * x1 + t2 * x2, t1 * y1 + t2 * y2, t1 * z1 + t2 * z2))
}

/// Initial great-circle bearing from `p1` towards `p2`, degrees in [0, 360).
pub fn initial_bearing(p1: LatLon, p2: LatLon) -> f64 {
    let lat1 = p1.0 * DTOR;
    let lat2 = p2.0 * DTOR;
    let dlon = (p2.1 - p1.1) * DTOR;

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let bearing = (x.atan2(y) * RTOD).rem_euclid(360.0);
    // rem_euclid may round a tiny negative angle up to exactly 360
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Haversine great-circle distance in nautical miles.
///
/// **Assumes a spherical Earth** of mean radius 6371 km.
pub fn great_circle_distance_nm(p1: LatLon, p2: LatLon) -> f64 {
    let dlat = (p2.0 - p1.0) * DTOR;
    let dlon = (p2.1 - p1.1) * DTOR;

    let a = (dlat / 2.0).sin().powi(2)
        + (p1.0 * DTOR).cos() * (p2.0 * DTOR).cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c * KM_TO_NM
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    const JFK: LatLon = (40.6413, -73.7781);
    const ORD: LatLon = (41.9742, -87.9073);

    fn assert_close(a: LatLon, b: LatLon, eps: f64) {
        assert!((a.0 - b.0).abs() < eps, "Latitude mismatch: {} vs {}", a.0, b.0);
        assert!((a.1 - b.1).abs() < eps, "Longitude mismatch: {} vs {}", a.1, b.1);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let routes = vec![
            (JFK, ORD),
            ((51.4700, -0.4543), (40.9769, 28.8146)),  // LHR -> IST
            ((-33.9461, 151.1772), (1.3644, 103.9915)), // SYD -> SIN
        ];

        for (p1, p2) in routes {
            assert_close(interpolate_position(p1, p2, 0.0), p1, EPSILON);
            assert_close(interpolate_position(p1, p2, 1.0), p2, EPSILON);
        }
    }

    #[test]
    fn test_interpolate_identical_points() {
        for f in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(interpolate_position(JFK, JFK, f), JFK);
        }
    }

    #[test]
    fn test_interpolate_equator_midpoint() {
        let mid = interpolate_position((0.0, 0.0), (0.0, 90.0), 0.5);
        assert_close(mid, (0.0, 45.0), EPSILON);
    }

    #[test]
    fn test_interpolate_stays_on_great_circle() {
        // Midpoint splits the route into two equal halves
        let mid = interpolate_position(JFK, ORD, 0.5);
        let d1 = great_circle_distance_nm(JFK, mid);
        let d2 = great_circle_distance_nm(mid, ORD);
        assert!((d1 - d2).abs() < 1e-6, "{} vs {}", d1, d2);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert!((initial_bearing((0.0, 0.0), (10.0, 0.0)) - 0.0).abs() < EPSILON);
        assert!((initial_bearing((0.0, 0.0), (0.0, 10.0)) - 90.0).abs() < EPSILON);
        assert!((initial_bearing((10.0, 0.0), (0.0, 0.0)) - 180.0).abs() < EPSILON);
        assert!((initial_bearing((0.0, 10.0), (0.0, 0.0)) - 270.0).abs() < EPSILON);
    }

    #[test]
    fn test_bearing_range() {
        let points = [
            JFK,
            ORD,
            (0.0, 0.0),
            (89.9, 0.0),
            (-89.9, 179.9),
            (0.0, -180.0),
            (0.0, 180.0),
            (-33.9, 18.4),
        ];
        for &p1 in &points {
            for &p2 in &points {
                let b = initial_bearing(p1, p2);
                assert!((0.0..360.0).contains(&b), "bearing {} for {:?} -> {:?}", b, p1, p2);
            }
        }
    }

    #[test]
    fn test_bearing_jfk_ord() {
        // JFK to ORD heads roughly west-northwest
        let b = initial_bearing(JFK, ORD);
        assert!(b > 270.0 && b < 300.0, "bearing {}", b);
    }

    #[test]
    fn test_distance_jfk_ord() {
        // Published great-circle distance is about 740 statute miles / 643 nm
        let d = great_circle_distance_nm(JFK, ORD);
        assert!((d - 641.5).abs() < 5.0, "Distance: {} nm", d);
    }

    #[test]
    fn test_distance_same_point() {
        assert!(great_circle_distance_nm(ORD, ORD).abs() < EPSILON);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = great_circle_distance_nm(JFK, ORD);
        let b = great_circle_distance_nm(ORD, JFK);
        assert!((a - b).abs() < EPSILON);
    }
}
