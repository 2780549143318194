//! Real Dubai-area locations for realistic test fixtures.
//!
//! Coordinates are in the Marina / JBR / Bluewaters corridor where most
//! hotel pickups happen, with meeting points at the harbour.

use tour_dispatch::geo::Coordinate;

/// A named location with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

// ============================================================================
// Hotel pickup points
// ============================================================================

pub const HOTELS: &[Location] = &[
    Location::new("Media City Beach Hotel", 25.0657, 55.1713),
    Location::new("Marina Walk Apartments", 25.0876, 55.1385),
    Location::new("Bluewaters Residence", 25.1124, 55.1387),
    Location::new("JBR The Walk Hotel", 25.0786, 55.1330),
    Location::new("Marina Promenade Suites", 25.0821, 55.1419),
];

// ============================================================================
// Tour meeting points (route destinations)
// ============================================================================

pub const MEETING_POINTS: &[Location] = &[
    Location::new("Dubai Harbour Berth 12", 25.1200, 55.1400),
    Location::new("Marina Yacht Club", 25.0790, 55.1465),
];
