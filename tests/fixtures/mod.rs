//! Test fixtures for tour-dispatch.
//!
//! Provides an in-memory back office implementing the collaborator traits,
//! builders for entities, and real Dubai-area coordinates.

#![allow(dead_code)]

pub mod dubai_locations;

pub use dubai_locations::*;

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use tour_dispatch::availability::{DateOverride, WeeklySlot};
use tour_dispatch::context::OrgContext;
use tour_dispatch::dispatch::TourAssignmentStatus;
use tour_dispatch::error::{Error, Result};
use tour_dispatch::timeofday::TimeOfDay;
use tour_dispatch::traits::{
    AssignedWindow, AssignmentStatus, AssignmentStore, AvailabilityStore, Booking, BookingStatus,
    Clock, Guide, GuideDirectory, GuideStatus, Notifier, PickupAssignment, TourRun, TourRunKey,
};

// ============================================================================
// Small parsing helpers
// ============================================================================

pub fn ctx() -> OrgContext {
    OrgContext::new("org-1", "user-1", "Asia/Dubai")
}

pub fn date(value: &str) -> NaiveDate {
    value.parse().expect("test date")
}

pub fn tod(value: &str) -> TimeOfDay {
    value.parse().expect("test time")
}

pub fn at(day: &str, time: &str) -> NaiveDateTime {
    date(day).and_time(tod(time).to_naive_time())
}

// ============================================================================
// Entity builders
// ============================================================================

pub fn guide(id: &str, vehicle_capacity: u32) -> Guide {
    Guide {
        id: id.to_string(),
        name: format!("Guide {}", id),
        vehicle_capacity,
        status: GuideStatus::Active,
    }
}

pub fn weekly(day_of_week: u8, start: &str, end: &str) -> WeeklySlot {
    WeeklySlot {
        day_of_week,
        start: tod(start),
        end: tod(end),
        is_available: true,
    }
}

pub fn day_off(day: &str, reason: Option<&str>) -> DateOverride {
    DateOverride {
        date: date(day),
        is_available: false,
        start: None,
        end: None,
        reason: reason.map(str::to_string),
    }
}

pub fn custom_hours(day: &str, start: &str, end: &str) -> DateOverride {
    DateOverride {
        date: date(day),
        is_available: true,
        start: Some(tod(start)),
        end: Some(tod(end)),
        reason: None,
    }
}

pub fn run_key(tour_id: &str, day: &str, time: &str) -> TourRunKey {
    TourRunKey::new(tour_id, date(day), tod(time))
}

pub fn tour_run(tour_id: &str, day: &str, time: &str, duration_minutes: u32) -> TourRun {
    TourRun {
        key: run_key(tour_id, day, time),
        tour_name: tour_id.to_string(),
        duration_minutes,
        meeting_point: Some(MEETING_POINTS[0].coordinate()),
        cancelled: false,
    }
}

pub fn booking(id: &str, participant_count: u32) -> Booking {
    Booking {
        id: id.to_string(),
        participant_count,
        status: BookingStatus::Confirmed,
    }
}

pub fn assignment(
    id: &str,
    booking_id: &str,
    guide_id: Option<&str>,
    run: &TourRunKey,
    pickup_order: u32,
    passenger_count: u32,
) -> PickupAssignment {
    PickupAssignment {
        id: id.to_string(),
        booking_id: booking_id.to_string(),
        guide_id: guide_id.map(str::to_string),
        run: run.clone(),
        pickup_order,
        passenger_count,
        estimated_pickup_time: None,
        status: AssignmentStatus::Confirmed,
    }
}

// ============================================================================
// In-memory back office
// ============================================================================

/// Implements every collaborator trait over plain maps. Run statuses and
/// notifications sit behind mutexes because the store traits take `&self`.
#[derive(Default)]
pub struct Backoffice {
    pub guides: Vec<Guide>,
    /// tour_id -> qualified guide ids; tours absent from the map accept
    /// every active guide.
    pub qualified: HashMap<String, Vec<String>>,
    pub weekly: HashMap<String, Vec<WeeklySlot>>,
    pub overrides: HashMap<String, Vec<DateOverride>>,
    pub runs: Vec<TourRun>,
    pub bookings: HashMap<TourRunKey, Vec<Booking>>,
    pub assignments: HashMap<TourRunKey, Vec<PickupAssignment>>,
    pub statuses: Mutex<HashMap<TourRunKey, TourAssignmentStatus>>,
    pub notifications: Mutex<Vec<(String, TourRunKey)>>,
    /// Simulate a broken read for one guide, for failure-isolation tests.
    pub fail_weekly_for: Option<String>,
}

impl Backoffice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guide(mut self, guide: Guide) -> Self {
        self.guides.push(guide);
        self
    }

    pub fn with_weekly(mut self, guide_id: &str, slots: Vec<WeeklySlot>) -> Self {
        self.weekly.insert(guide_id.to_string(), slots);
        self
    }

    pub fn with_override(mut self, guide_id: &str, o: DateOverride) -> Self {
        self.overrides.entry(guide_id.to_string()).or_default().push(o);
        self
    }

    pub fn with_run(mut self, run: TourRun) -> Self {
        self.runs.push(run);
        self
    }

    pub fn with_booking(mut self, run: &TourRunKey, booking: Booking) -> Self {
        self.bookings.entry(run.clone()).or_default().push(booking);
        self
    }

    pub fn with_assignment(mut self, a: PickupAssignment) -> Self {
        self.assignments.entry(a.run.clone()).or_default().push(a);
        self
    }
}

impl GuideDirectory for Backoffice {
    fn active_guides_qualified_for(&self, _ctx: &OrgContext, tour_id: &str) -> Result<Vec<Guide>> {
        let qualified = self.qualified.get(tour_id);
        Ok(self
            .guides
            .iter()
            .filter(|g| g.status == GuideStatus::Active)
            .filter(|g| qualified.is_none_or(|ids| ids.contains(&g.id)))
            .cloned()
            .collect())
    }
}

impl AvailabilityStore for Backoffice {
    fn weekly_slots(&self, _ctx: &OrgContext, guide_id: &str) -> Result<Vec<WeeklySlot>> {
        if self.fail_weekly_for.as_deref() == Some(guide_id) {
            return Err(Error::validation(format!(
                "corrupt weekly pattern for {}",
                guide_id
            )));
        }
        Ok(self.weekly.get(guide_id).cloned().unwrap_or_default())
    }

    fn override_for(
        &self,
        _ctx: &OrgContext,
        guide_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DateOverride>> {
        Ok(self
            .overrides
            .get(guide_id)
            .and_then(|list| list.iter().find(|o| o.date == date))
            .cloned())
    }
}

impl AssignmentStore for Backoffice {
    fn runs_on_date(&self, _ctx: &OrgContext, date: NaiveDate) -> Result<Vec<TourRun>> {
        Ok(self
            .runs
            .iter()
            .filter(|run| run.key.date == date)
            .cloned()
            .collect())
    }

    fn run(&self, _ctx: &OrgContext, key: &TourRunKey) -> Result<TourRun> {
        self.runs
            .iter()
            .find(|run| run.key == *key)
            .cloned()
            .ok_or_else(|| Error::not_found("tour run", format!("{:?}", key)))
    }

    fn bookings_for_run(&self, _ctx: &OrgContext, key: &TourRunKey) -> Result<Vec<Booking>> {
        Ok(self.bookings.get(key).cloned().unwrap_or_default())
    }

    fn pickup_assignments_for_run(
        &self,
        _ctx: &OrgContext,
        key: &TourRunKey,
    ) -> Result<Vec<PickupAssignment>> {
        Ok(self.assignments.get(key).cloned().unwrap_or_default())
    }

    fn confirmed_windows_for_guide(
        &self,
        _ctx: &OrgContext,
        guide_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<AssignedWindow>> {
        let mut windows = Vec::new();
        for run in self.runs.iter().filter(|run| run.key.date == date) {
            let committed = self
                .assignments
                .get(&run.key)
                .map(|list| {
                    list.iter().any(|a| {
                        a.status == AssignmentStatus::Confirmed
                            && a.guide_id.as_deref() == Some(guide_id)
                    })
                })
                .unwrap_or(false);
            if committed {
                let (starts_at, ends_at) = run.window();
                windows.push(AssignedWindow {
                    run: run.key.clone(),
                    tour_name: run.tour_name.clone(),
                    starts_at,
                    ends_at,
                });
            }
        }
        Ok(windows)
    }

    fn run_status(
        &self,
        _ctx: &OrgContext,
        key: &TourRunKey,
    ) -> Result<Option<TourAssignmentStatus>> {
        Ok(self.statuses.lock().unwrap().get(key).copied())
    }

    fn set_run_status(
        &self,
        _ctx: &OrgContext,
        key: &TourRunKey,
        status: TourAssignmentStatus,
    ) -> Result<()> {
        self.statuses.lock().unwrap().insert(key.clone(), status);
        Ok(())
    }
}

impl Notifier for Backoffice {
    fn notify_guide(&self, _ctx: &OrgContext, guide_id: &str, run: &TourRunKey) -> Result<()> {
        self.notifications
            .lock()
            .unwrap()
            .push((guide_id.to_string(), run.clone()));
        Ok(())
    }
}

/// A clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
