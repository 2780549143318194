//! Pickup route ordering, timing and scoring.
//!
//! The ordering heuristic is plain nearest-neighbor: good enough for a
//! handful of hotel pickups feeding one tour departure, and deterministic.
//! Ties are broken by input order (first match wins) — no randomness, so
//! the same input always yields the same route.
//!
//! Everything here is advisory. Pickups with unusable coordinates are
//! never dropped and never cause an error; they ride along at the end of
//! the route with fallback timings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geo::{self, Coordinate, HaversineEstimator, TravelEstimator};
use crate::timeofday::TimeOfDay;

/// Zone bucket for pickups without a usable zone label.
pub const UNKNOWN_ZONE: &str = "unknown";

/// Dwell time at a stop when the pickup point does not specify one.
pub const DEFAULT_PICKUP_MINUTES: u32 = 5;

/// Gap to leave between the last pickup's arrival at the meeting point
/// and the tour's scheduled start.
pub const DEFAULT_ARRIVAL_BUFFER_MINUTES: u32 = 5;

/// Adding a pickup is considered efficient if it costs at most this much.
const EFFICIENT_ADDITION_MINUTES: u32 = 15;

/// Maximum distance at which a coordinate is matched to a known zone.
const ZONE_PROXIMITY_KM: f64 = 5.0;

/// A customer pickup location attached to a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupPoint {
    pub id: String,
    pub coordinate: Option<Coordinate>,
    /// Dwell time at this stop; [`DEFAULT_PICKUP_MINUTES`] when absent.
    pub average_pickup_minutes: Option<u32>,
    /// Free-text zone label; open-ended business data, not an enum.
    pub zone: Option<String>,
}

impl PickupPoint {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            coordinate: Some(Coordinate::new(latitude, longitude)),
            average_pickup_minutes: None,
            zone: None,
        }
    }

    /// The coordinate, but only if present and in range.
    pub fn valid_coordinate(&self) -> Option<Coordinate> {
        self.coordinate.filter(Coordinate::is_valid)
    }

    pub fn dwell_minutes(&self) -> u32 {
        self.average_pickup_minutes.unwrap_or(DEFAULT_PICKUP_MINUTES)
    }
}

/// Estimated pickup time for one stop, keyed by pickup id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupEta {
    pub id: String,
    pub estimated_pickup_time: TimeOfDay,
}

/// Marginal cost of inserting one more pickup into an existing route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteImpact {
    pub added_minutes: u32,
    pub new_total_minutes: u32,
    pub is_efficient: bool,
    pub efficiency_score: u8,
}

/// A named zone anchored at a representative coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownZone {
    pub name: String,
    pub center: Coordinate,
}

/// Orders pickups and derives per-stop timings against a travel estimator.
#[derive(Debug, Clone)]
pub struct RouteOptimizer<E = HaversineEstimator> {
    estimator: E,
}

impl Default for RouteOptimizer<HaversineEstimator> {
    fn default() -> Self {
        Self {
            estimator: HaversineEstimator::default(),
        }
    }
}

impl<E: TravelEstimator> RouteOptimizer<E> {
    pub fn new(estimator: E) -> Self {
        Self { estimator }
    }

    /// Order pickups by repeated nearest-neighbor selection.
    ///
    /// Starts from `start_point` if it is valid, otherwise from the first
    /// pickup with a valid coordinate (which is then placed first in the
    /// result). Pickups without a valid coordinate are excluded from the
    /// search and appended, in input order, at the end — they stay on the
    /// manifest even though they cannot be routed.
    pub fn optimize_pickup_order(
        &self,
        pickups: &[PickupPoint],
        start_point: Option<Coordinate>,
    ) -> Vec<PickupPoint> {
        let mut routable: Vec<&PickupPoint> = Vec::new();
        let mut unroutable: Vec<&PickupPoint> = Vec::new();
        for pickup in pickups {
            if pickup.valid_coordinate().is_some() {
                routable.push(pickup);
            } else {
                unroutable.push(pickup);
            }
        }

        if !unroutable.is_empty() {
            debug!(
                excluded = unroutable.len(),
                "pickups without valid coordinates appended unordered"
            );
        }

        let mut ordered: Vec<PickupPoint> = Vec::with_capacity(pickups.len());
        let mut remaining = routable;

        let mut position = match start_point.filter(Coordinate::is_valid) {
            Some(start) => start,
            None => {
                if remaining.is_empty() {
                    ordered.extend(unroutable.into_iter().cloned());
                    return ordered;
                }
                let first = remaining.remove(0);
                let coord = first.valid_coordinate().unwrap_or(Coordinate::new(0.0, 0.0));
                ordered.push(first.clone());
                coord
            }
        };

        while !remaining.is_empty() {
            // First match wins on equal distance, keeping input order as
            // the tie-break.
            let mut nearest = 0;
            let mut nearest_km = f64::INFINITY;
            for (index, pickup) in remaining.iter().enumerate() {
                let coord = match pickup.valid_coordinate() {
                    Some(coord) => coord,
                    None => continue,
                };
                let km = self.estimator.distance_km(position, coord);
                if km < nearest_km {
                    nearest_km = km;
                    nearest = index;
                }
            }

            let next = remaining.remove(nearest);
            if let Some(coord) = next.valid_coordinate() {
                position = coord;
            }
            ordered.push(next.clone());
        }

        ordered.extend(unroutable.into_iter().cloned());
        ordered
    }

    /// Total minutes to work through `ordered` and arrive at `destination`:
    /// dwell at each stop plus the drive leg to the next stop (or to the
    /// destination after the last stop). Empty route is zero.
    pub fn route_duration_minutes(
        &self,
        ordered: &[PickupPoint],
        destination: Coordinate,
    ) -> u32 {
        let mut total = 0u32;
        for (index, pickup) in ordered.iter().enumerate() {
            total += pickup.dwell_minutes();
            let from = pickup.coordinate.unwrap_or(Coordinate::new(f64::NAN, f64::NAN));
            let to = match ordered.get(index + 1) {
                Some(next) => next.coordinate.unwrap_or(Coordinate::new(f64::NAN, f64::NAN)),
                None => destination,
            };
            total += self.estimator.drive_minutes(from, to);
        }
        total
    }

    /// Backward-calculate per-stop pickup times from the tour start.
    ///
    /// The last pickup must reach `destination` by
    /// `tour_start − buffer_minutes`; every earlier pickup backs off by the
    /// next stop's dwell time plus the drive leg between them. Results are
    /// aligned with the order of `ordered` and keyed by pickup id.
    pub fn calculate_pickup_times(
        &self,
        ordered: &[PickupPoint],
        destination: Coordinate,
        tour_start: TimeOfDay,
        buffer_minutes: u32,
    ) -> Vec<PickupEta> {
        if ordered.is_empty() {
            return Vec::new();
        }

        let coordinate_of = |pickup: &PickupPoint| {
            pickup.coordinate.unwrap_or(Coordinate::new(f64::NAN, f64::NAN))
        };

        let mut minutes = vec![0i64; ordered.len()];
        let last = ordered.len() - 1;
        let arrival_deadline = tour_start.minutes() as i64 - buffer_minutes as i64;
        minutes[last] = arrival_deadline
            - self
                .estimator
                .drive_minutes(coordinate_of(&ordered[last]), destination) as i64;

        for index in (0..last).rev() {
            let next = &ordered[index + 1];
            let leg = self
                .estimator
                .drive_minutes(coordinate_of(&ordered[index]), coordinate_of(next));
            minutes[index] = minutes[index + 1] - (next.dwell_minutes() as i64 + leg as i64);
        }

        ordered
            .iter()
            .zip(minutes)
            .map(|(pickup, at)| {
                let clamped = if at < 0 {
                    warn!(
                        pickup = %pickup.id,
                        minutes = at,
                        "pickup time underflowed midnight, clamping to 00:00"
                    );
                    0
                } else {
                    at
                };
                PickupEta {
                    id: pickup.id.clone(),
                    estimated_pickup_time: TimeOfDay::from_minutes(clamped as u16)
                        .unwrap_or(TimeOfDay::MIDNIGHT),
                }
            })
            .collect()
    }

    /// Route efficiency on a 0-100 scale: how close the actual path is to
    /// the straight line from the first pickup to the destination.
    ///
    /// Zero or one pickups are trivially efficient (100). A route whose
    /// pickups all lack valid coordinates scores 0.
    pub fn route_efficiency(&self, ordered: &[PickupPoint], destination: Coordinate) -> u8 {
        if ordered.len() <= 1 {
            return 100;
        }

        let coords: Vec<Coordinate> = ordered
            .iter()
            .filter_map(PickupPoint::valid_coordinate)
            .collect();
        let Some(first) = coords.first() else {
            return 0;
        };

        let direct = self.estimator.distance_km(*first, destination);
        let mut actual = 0.0;
        for pair in coords.windows(2) {
            actual += self.estimator.distance_km(pair[0], pair[1]);
        }
        if let Some(last) = coords.last() {
            actual += self.estimator.distance_km(*last, destination);
        }

        if actual == 0.0 {
            return 100;
        }
        (direct / actual * 100.0).min(100.0).round() as u8
    }

    /// Preview the cost of inserting `new_pickup` at `insert_index`
    /// (clamped into range) on the way to `destination`.
    pub fn analyze_pickup_addition(
        &self,
        existing: &[PickupPoint],
        new_pickup: &PickupPoint,
        insert_index: usize,
        destination: Coordinate,
    ) -> RouteImpact {
        let index = insert_index.min(existing.len());
        let mut candidate: Vec<PickupPoint> = existing.to_vec();
        candidate.insert(index, new_pickup.clone());

        let before = self.route_duration_minutes(existing, destination);
        let after = self.route_duration_minutes(&candidate, destination);
        let added = after.saturating_sub(before);

        RouteImpact {
            added_minutes: added,
            new_total_minutes: after,
            is_efficient: added <= EFFICIENT_ADDITION_MINUTES,
            efficiency_score: self.route_efficiency(&candidate, destination),
        }
    }
}

/// Group pickups by zone label. Missing or empty zones land under
/// [`UNKNOWN_ZONE`].
pub fn cluster_by_zone(pickups: &[PickupPoint]) -> HashMap<String, Vec<&PickupPoint>> {
    let mut clusters: HashMap<String, Vec<&PickupPoint>> = HashMap::new();
    for pickup in pickups {
        let zone = match pickup.zone.as_deref() {
            Some(zone) if !zone.trim().is_empty() => zone.to_string(),
            _ => UNKNOWN_ZONE.to_string(),
        };
        clusters.entry(zone).or_default().push(pickup);
    }
    clusters
}

/// Match a coordinate to the nearest known zone within
/// [`ZONE_PROXIMITY_KM`]. `None` for invalid coordinates or when nothing
/// is close enough.
pub fn infer_zone(coordinate: Coordinate, known_zones: &[KnownZone]) -> Option<String> {
    if !coordinate.is_valid() {
        return None;
    }

    let mut best: Option<(&KnownZone, f64)> = None;
    for zone in known_zones {
        if !zone.center.is_valid() {
            continue;
        }
        let km = geo::distance_km(coordinate, zone.center);
        if best.map_or(true, |(_, best_km)| km < best_km) {
            best = Some((zone, km));
        }
    }

    best.and_then(|(zone, km)| (km <= ZONE_PROXIMITY_KM).then(|| zone.name.clone()))
}
