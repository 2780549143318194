//! OSRM HTTP adapter for road-network travel estimates.
//!
//! Optional upgrade over the built-in haversine estimator. Any transport
//! or decode failure degrades to the haversine estimate — pickup routing
//! is advisory and must keep working when the routing service is down.

use serde::Deserialize;
use tracing::debug;

use crate::geo::{Coordinate, DEFAULT_DRIVE_MINUTES, HaversineEstimator, TravelEstimator};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmTravel {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
    fallback: HaversineEstimator,
}

impl OsrmTravel {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            fallback: HaversineEstimator::default(),
        })
    }

    /// One routed leg between two points, `None` on any failure.
    fn route_leg(&self, from: Coordinate, to: Coordinate) -> Option<OsrmRoute> {
        let url = format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.config.base_url,
            self.config.profile,
            from.longitude,
            from.latitude,
            to.longitude,
            to.latitude,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmRouteResponse>());

        match response {
            Ok(body) => body.routes.into_iter().next(),
            Err(err) => {
                debug!(error = %err, "OSRM request failed, using haversine estimate");
                None
            }
        }
    }
}

impl TravelEstimator for OsrmTravel {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> f64 {
        if !from.is_valid() || !to.is_valid() {
            return 0.0;
        }
        match self.route_leg(from, to) {
            Some(route) => route.distance / 1000.0,
            None => self.fallback.distance_km(from, to),
        }
    }

    fn drive_minutes(&self, from: Coordinate, to: Coordinate) -> u32 {
        if !from.is_valid() || !to.is_valid() {
            return DEFAULT_DRIVE_MINUTES;
        }
        match self.route_leg(from, to) {
            Some(route) => (route.duration / 60.0).ceil() as u32,
            None => self.fallback.drive_minutes(from, to),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}
