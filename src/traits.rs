//! Domain entities and external collaborator traits.
//!
//! The engine owns no storage. Guides, availability data, bookings and
//! assignments live behind these traits; concrete apps implement them over
//! their own persistence. Every call takes the explicit [`OrgContext`] so
//! stores can scope reads and writes to the caller's organization.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::availability::{DateOverride, WeeklySlot};
use crate::context::OrgContext;
use crate::dispatch::TourAssignmentStatus;
use crate::error::Result;
use crate::geo::Coordinate;
use crate::timeofday::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub id: String,
    pub name: String,
    pub vehicle_capacity: u32,
    pub status: GuideStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub participant_count: u32,
    pub status: BookingStatus,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// One departure instance of a tour product: a virtual schedule unit,
/// not a stored row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TourRunKey {
    pub tour_id: String,
    pub date: NaiveDate,
    pub time: TimeOfDay,
}

impl TourRunKey {
    pub fn new(tour_id: impl Into<String>, date: NaiveDate, time: TimeOfDay) -> Self {
        Self {
            tour_id: tour_id.into(),
            date,
            time,
        }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time.to_naive_time())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourRun {
    pub key: TourRunKey,
    pub tour_name: String,
    pub duration_minutes: u32,
    /// Where the tour departs from; the destination of the pickup route.
    pub meeting_point: Option<Coordinate>,
    pub cancelled: bool,
}

impl TourRun {
    pub fn window(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.key.starts_at();
        (start, start + Duration::minutes(self.duration_minutes as i64))
    }
}

/// Binds a booking's pickup to a guide (or to nobody, for outsourced runs)
/// on one tour run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupAssignment {
    pub id: String,
    pub booking_id: String,
    /// `None` means outsourced/unassigned transport.
    pub guide_id: Option<String>,
    pub run: TourRunKey,
    pub pickup_order: u32,
    pub passenger_count: u32,
    pub estimated_pickup_time: Option<TimeOfDay>,
    pub status: AssignmentStatus,
}

impl PickupAssignment {
    pub fn is_active(&self) -> bool {
        self.status != AssignmentStatus::Cancelled
    }
}

/// A confirmed time window a guide is already committed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedWindow {
    pub run: TourRunKey,
    pub tour_name: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
}

/// Source of "now" for past-run checks. Injected so tests control time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the process-local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Read side of the guide directory.
pub trait GuideDirectory {
    /// Active guides qualified to lead the given tour product.
    fn active_guides_qualified_for(&self, ctx: &OrgContext, tour_id: &str) -> Result<Vec<Guide>>;
}

/// Read side of the availability tables: weekly recurring slots and
/// date-specific overrides, both keyed by guide.
pub trait AvailabilityStore {
    fn weekly_slots(&self, ctx: &OrgContext, guide_id: &str) -> Result<Vec<WeeklySlot>>;

    /// The override for one calendar date, if any. At most one exists per
    /// guide per date; the store enforces that at write time.
    fn override_for(
        &self,
        ctx: &OrgContext,
        guide_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DateOverride>>;
}

/// Read/write side of the booking and assignment tables. The engine only
/// reads bookings; the single write it performs is the run-status
/// transition for the approval flow.
pub trait AssignmentStore {
    /// All runs departing on a date, cancelled ones included; the
    /// aggregator filters.
    fn runs_on_date(&self, ctx: &OrgContext, date: NaiveDate) -> Result<Vec<TourRun>>;

    fn run(&self, ctx: &OrgContext, key: &TourRunKey) -> Result<TourRun>;

    fn bookings_for_run(&self, ctx: &OrgContext, key: &TourRunKey) -> Result<Vec<Booking>>;

    fn pickup_assignments_for_run(
        &self,
        ctx: &OrgContext,
        key: &TourRunKey,
    ) -> Result<Vec<PickupAssignment>>;

    /// Confirmed windows the guide is committed to on a date, across all
    /// runs.
    fn confirmed_windows_for_guide(
        &self,
        ctx: &OrgContext,
        guide_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<AssignedWindow>>;

    fn run_status(
        &self,
        ctx: &OrgContext,
        key: &TourRunKey,
    ) -> Result<Option<TourAssignmentStatus>>;

    fn set_run_status(
        &self,
        ctx: &OrgContext,
        key: &TourRunKey,
        status: TourAssignmentStatus,
    ) -> Result<()>;
}

/// Outbound notification dispatch; delivery mechanics are external.
pub trait Notifier {
    fn notify_guide(&self, ctx: &OrgContext, guide_id: &str, run: &TourRunKey) -> Result<()>;
}
