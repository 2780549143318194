//! Great-circle distance and drive-time estimation.
//!
//! Straight-line haversine distance with an assumed urban driving speed.
//! Ignores roads, so estimates are conservative: drive time always rounds
//! up. Invalid coordinates never fail — routing is advisory, and callers
//! prefer a degraded estimate over a hard error at this layer.

use serde::{Deserialize, Serialize};

/// Assumed average urban driving speed.
pub const DEFAULT_SPEED_KMH: f64 = 30.0;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Drive-time fallback when either coordinate is unusable.
pub const DEFAULT_DRIVE_MINUTES: u32 = 5;

/// A WGS84 point. Validity is checked at use sites, not at construction:
/// bad coordinates flow in from external data and are treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components finite and within range. NaN, infinities and
    /// out-of-range values all count as invalid.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Haversine great-circle distance in kilometers.
///
/// Exact coordinate equality short-circuits to 0.0 so identical points
/// never pick up floating-point noise from the trig near zero.
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    if from == to {
        return 0.0;
    }

    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Estimated drive time in whole minutes at [`DEFAULT_SPEED_KMH`].
///
/// Rounds up to stay conservative in traffic. Returns
/// [`DEFAULT_DRIVE_MINUTES`] when either coordinate is invalid.
pub fn drive_minutes(from: Coordinate, to: Coordinate) -> u32 {
    minutes_at_speed(from, to, DEFAULT_SPEED_KMH)
}

fn minutes_at_speed(from: Coordinate, to: Coordinate, speed_kmh: f64) -> u32 {
    if !from.is_valid() || !to.is_valid() {
        return DEFAULT_DRIVE_MINUTES;
    }
    let km = distance_km(from, to);
    (km / speed_kmh * 60.0).ceil() as u32
}

/// Travel estimation seam between the route optimizer and whatever
/// provides distances: the built-in haversine estimate or a road-network
/// service like OSRM.
pub trait TravelEstimator {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> f64;
    fn drive_minutes(&self, from: Coordinate, to: Coordinate) -> u32;
}

/// Haversine-based travel estimator with a configurable assumed speed.
#[derive(Debug, Clone)]
pub struct HaversineEstimator {
    pub speed_kmh: f64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineEstimator {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }
}

impl TravelEstimator for HaversineEstimator {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> f64 {
        if !from.is_valid() || !to.is_valid() {
            return 0.0;
        }
        distance_km(from, to)
    }

    fn drive_minutes(&self, from: Coordinate, to: Coordinate) -> u32 {
        minutes_at_speed(from, to, self.speed_kmh)
    }
}
