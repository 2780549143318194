//! Per-day dispatch aggregation and the approval state machine.
//!
//! Builds the assignment-readiness view a dispatcher works from: every
//! run of the day with its booking counts and status, guides ranked by
//! fitness for a run, and the bulk approve/notify transitions.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::conflict::ConflictChecker;
use crate::context::OrgContext;
use crate::error::{Error, Result};
use crate::traits::{
    AssignmentStore, AvailabilityStore, Clock, Guide, GuideDirectory, GuideStatus, Notifier,
    PickupAssignment, TourRun, TourRunKey,
};

/// Assignment status of one tour run.
///
/// Derivation only ever produces `NeedsAttention` or `Ready`; `Approved`
/// and `Notified` come from explicit bulk transitions and survive
/// recomputation only while the run still derives `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourAssignmentStatus {
    NeedsAttention,
    Ready,
    Approved,
    Notified,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourRunSummary {
    pub key: TourRunKey,
    pub tour_name: String,
    /// Participants across non-cancelled bookings.
    pub guest_count: u32,
    pub booking_count: u32,
    /// Non-cancelled bookings with no active pickup assignment.
    pub unassigned_bookings: u32,
    pub status: TourAssignmentStatus,
    pub is_past: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub total_runs: u32,
    pub total_guests: u32,
    pub total_bookings: u32,
    pub unassigned_bookings: u32,
    pub needs_attention: u32,
    pub ready: u32,
    pub approved: u32,
    pub notified: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOverview {
    pub stats: DayStats,
    pub tours: Vec<TourRunSummary>,
}

/// Day runs bucketed by local departure hour: [0,12) morning, [12,17)
/// afternoon, [17,24) evening.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayPeriods {
    pub morning: Vec<TourRunSummary>,
    pub afternoon: Vec<TourRunSummary>,
    pub evening: Vec<TourRunSummary>,
}

/// A guide scored against one run: remaining seats and conflict state.
/// The engine reports capacity, it does not reject over-capacity
/// assignments — that stays a caller decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableGuide {
    pub guide: Guide,
    pub current_load: u32,
    pub available_capacity: u32,
    pub has_conflict: bool,
    pub conflict_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApproveOutcome {
    pub approved: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotifyOutcome {
    pub notified: u32,
    pub skipped: u32,
}

/// Check that active pickup orders within one guide assignment form a
/// strict permutation 0..n-1 — no gaps, no duplicates.
pub fn validate_pickup_order(assignments: &[PickupAssignment]) -> Result<()> {
    let orders: BTreeSet<u32> = assignments
        .iter()
        .filter(|a| a.is_active())
        .map(|a| a.pickup_order)
        .collect();
    let count = assignments.iter().filter(|a| a.is_active()).count() as u32;

    if orders.len() as u32 != count || orders.iter().next_back().map_or(false, |max| *max != count - 1)
    {
        return Err(Error::validation(format!(
            "pickup order must be a permutation of 0..{}",
            count
        )));
    }
    Ok(())
}

pub struct DispatchAggregator<'a, G, A, S, C> {
    guides: &'a G,
    availability: &'a A,
    assignments: &'a S,
    clock: &'a C,
    ctx: &'a OrgContext,
}

impl<'a, G, A, S, C> DispatchAggregator<'a, G, A, S, C>
where
    G: GuideDirectory + Sync,
    A: AvailabilityStore + Sync,
    S: AssignmentStore + Sync,
    C: Clock + Sync,
{
    pub fn new(
        guides: &'a G,
        availability: &'a A,
        assignments: &'a S,
        clock: &'a C,
        ctx: &'a OrgContext,
    ) -> Self {
        Self {
            guides,
            availability,
            assignments,
            clock,
            ctx,
        }
    }

    /// Every non-cancelled run on `date` with derived status, plus the
    /// day-level rollup. Runs are summarized in parallel; each summary is
    /// a handful of bounded store reads.
    pub fn day_overview(&self, date: NaiveDate) -> Result<DayOverview> {
        let now = self.clock.now();
        let runs = self.assignments.runs_on_date(self.ctx, date)?;
        let mut tours: Vec<TourRunSummary> = runs
            .par_iter()
            .filter(|run| !run.cancelled)
            .map(|run| self.summarize_run(run, now))
            .collect::<Result<_>>()?;

        tours.sort_by(|a, b| a.key.time.cmp(&b.key.time).then(a.key.tour_id.cmp(&b.key.tour_id)));

        let mut stats = DayStats::default();
        for tour in &tours {
            stats.total_runs += 1;
            stats.total_guests += tour.guest_count;
            stats.total_bookings += tour.booking_count;
            stats.unassigned_bookings += tour.unassigned_bookings;
            match tour.status {
                TourAssignmentStatus::NeedsAttention => stats.needs_attention += 1,
                TourAssignmentStatus::Ready => stats.ready += 1,
                TourAssignmentStatus::Approved => stats.approved += 1,
                TourAssignmentStatus::Notified => stats.notified += 1,
            }
        }

        Ok(DayOverview { stats, tours })
    }

    /// The day's runs bucketed into morning/afternoon/evening.
    pub fn group_by_period(&self, date: NaiveDate) -> Result<DayPeriods> {
        let overview = self.day_overview(date)?;
        let mut periods = DayPeriods::default();
        for tour in overview.tours {
            match tour.key.time.hour() {
                0..=11 => periods.morning.push(tour),
                12..=16 => periods.afternoon.push(tour),
                _ => periods.evening.push(tour),
            }
        }
        Ok(periods)
    }

    /// Qualified, active guides scored against one run: current passenger
    /// load on the run, remaining capacity, and any conflict with the
    /// run's window (the run itself excluded from overlap checks).
    ///
    /// Sorted no-conflict first, then by descending remaining capacity.
    /// A guide whose scoring fails is logged and left out; one guide's
    /// bad data must not take down the whole list.
    pub fn available_guides_for_run(&self, key: &TourRunKey) -> Result<Vec<AvailableGuide>> {
        let run = self.assignments.run(self.ctx, key)?;
        let (window_start, window_end) = run.window();
        let run_assignments = self.assignments.pickup_assignments_for_run(self.ctx, key)?;
        let guides = self
            .guides
            .active_guides_qualified_for(self.ctx, &key.tour_id)?;

        let checker = ConflictChecker::new(self.availability, self.assignments, self.ctx);

        let mut scored: Vec<AvailableGuide> = guides
            .par_iter()
            .filter(|guide| guide.status == GuideStatus::Active)
            .filter_map(|guide| {
                match self.score_guide(
                    guide,
                    &checker,
                    &run_assignments,
                    key,
                    window_start,
                    window_end,
                ) {
                    Ok(available) => Some(available),
                    Err(err) => {
                        warn!(
                            guide = %guide.id,
                            tour = %key.tour_id,
                            error = %err,
                            "excluding guide from availability list"
                        );
                        None
                    }
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            a.has_conflict
                .cmp(&b.has_conflict)
                .then(b.available_capacity.cmp(&a.available_capacity))
        });

        Ok(scored)
    }

    /// Promote every `Ready` run of the day to `Approved`. Anything not
    /// currently `Ready` is counted as skipped, never silently promoted.
    pub fn approve_all_ready(&self, date: NaiveDate) -> Result<ApproveOutcome> {
        let overview = self.day_overview(date)?;
        let mut outcome = ApproveOutcome::default();
        for tour in &overview.tours {
            if tour.status == TourAssignmentStatus::Ready {
                self.assignments
                    .set_run_status(self.ctx, &tour.key, TourAssignmentStatus::Approved)?;
                outcome.approved += 1;
            } else {
                outcome.skipped += 1;
            }
        }
        Ok(outcome)
    }

    /// Notify the assigned guides of every `Approved` run, then mark the
    /// run `Notified`. Runs in any other status are skipped.
    pub fn notify_all_guides<N: Notifier>(
        &self,
        date: NaiveDate,
        notifier: &N,
    ) -> Result<NotifyOutcome> {
        let overview = self.day_overview(date)?;
        let mut outcome = NotifyOutcome::default();
        for tour in &overview.tours {
            if tour.status != TourAssignmentStatus::Approved {
                outcome.skipped += 1;
                continue;
            }

            let assignments = self
                .assignments
                .pickup_assignments_for_run(self.ctx, &tour.key)?;
            let guide_ids: BTreeSet<&str> = assignments
                .iter()
                .filter(|a| a.is_active())
                .filter_map(|a| a.guide_id.as_deref())
                .collect();
            for guide_id in guide_ids {
                notifier.notify_guide(self.ctx, guide_id, &tour.key)?;
            }

            self.assignments
                .set_run_status(self.ctx, &tour.key, TourAssignmentStatus::Notified)?;
            outcome.notified += 1;
        }
        Ok(outcome)
    }

    fn summarize_run(&self, run: &TourRun, now: NaiveDateTime) -> Result<TourRunSummary> {
        let bookings = self.assignments.bookings_for_run(self.ctx, &run.key)?;
        let assignments = self
            .assignments
            .pickup_assignments_for_run(self.ctx, &run.key)?;

        let assigned: BTreeSet<&str> = assignments
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.booking_id.as_str())
            .collect();

        let mut guest_count = 0;
        let mut booking_count = 0;
        let mut unassigned = 0;
        for booking in bookings.iter().filter(|b| b.is_active()) {
            booking_count += 1;
            guest_count += booking.participant_count;
            if !assigned.contains(booking.id.as_str()) {
                unassigned += 1;
            }
        }

        let derived = if unassigned == 0 && booking_count > 0 {
            TourAssignmentStatus::Ready
        } else {
            TourAssignmentStatus::NeedsAttention
        };

        // An explicit approval survives only while the run still derives
        // ready; a booking added unassigned later drags it back.
        let status = match (derived, self.assignments.run_status(self.ctx, &run.key)?) {
            (
                TourAssignmentStatus::Ready,
                Some(stored @ (TourAssignmentStatus::Approved | TourAssignmentStatus::Notified)),
            ) => stored,
            (derived, _) => derived,
        };

        Ok(TourRunSummary {
            key: run.key.clone(),
            tour_name: run.tour_name.clone(),
            guest_count,
            booking_count,
            unassigned_bookings: unassigned,
            status,
            is_past: run.key.starts_at() < now,
        })
    }

    fn score_guide(
        &self,
        guide: &Guide,
        checker: &ConflictChecker<'_, A, S>,
        run_assignments: &[PickupAssignment],
        key: &TourRunKey,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> Result<AvailableGuide> {
        let current_load: u32 = run_assignments
            .iter()
            .filter(|a| a.is_active() && a.guide_id.as_deref() == Some(guide.id.as_str()))
            .map(|a| a.passenger_count)
            .sum();

        let conflict = checker.check(&guide.id, window_start, window_end, Some(key))?;

        Ok(AvailableGuide {
            guide: guide.clone(),
            current_load,
            available_capacity: guide.vehicle_capacity.saturating_sub(current_load),
            has_conflict: conflict.is_some(),
            conflict_reason: conflict.map(|reason| reason.to_string()),
        })
    }
}
