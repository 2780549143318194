//! tour-dispatch core
//!
//! Daily tour dispatch and pickup routing: availability/conflict
//! resolution for guide assignment, per-day readiness aggregation, and a
//! nearest-neighbor pickup route with backward-calculated pickup times.
//! Storage, notifications and auth stay behind the traits in [`traits`].

pub mod availability;
pub mod conflict;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod osrm;
pub mod route;
pub mod timeofday;
pub mod traits;
