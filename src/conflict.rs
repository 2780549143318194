//! Guide assignment conflict detection.
//!
//! Read-only feasibility check: it reports why a guide cannot take a time
//! window, it never mutates assignment state. The caller decides what to
//! do, and the storage layer's uniqueness constraint closes the
//! check-then-act race at write time.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::availability::day_of_week;
use crate::context::OrgContext;
use crate::error::{Error, Result};
use crate::traits::{AssignmentStore, AvailabilityStore, TourRunKey};

/// Why a guide cannot be assigned, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictReason {
    /// A date override marks the guide unavailable; carries the override's
    /// reason when one was recorded.
    UnavailableOnDate { reason: Option<String> },
    /// The weekly pattern has no slot at all for this day of week. Only
    /// day presence is checked here; time-of-day fit is
    /// `AvailabilityResolver::is_available_for_interval`'s job.
    NoWeeklySlot,
    /// Another confirmed run overlaps the requested window.
    OverlappingRun { tour_name: String },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::UnavailableOnDate { reason: Some(reason) } => f.write_str(reason),
            ConflictReason::UnavailableOnDate { reason: None } => {
                f.write_str("unavailable on this date")
            }
            ConflictReason::NoWeeklySlot => f.write_str("not available on this day of week"),
            ConflictReason::OverlappingRun { tour_name } => {
                write!(f, "already assigned to {}", tour_name)
            }
        }
    }
}

/// Checks a guide's feasibility for a time window against availability
/// data and existing confirmed assignments.
pub struct ConflictChecker<'a, A: AvailabilityStore, S: AssignmentStore> {
    availability: &'a A,
    assignments: &'a S,
    ctx: &'a OrgContext,
}

impl<'a, A: AvailabilityStore, S: AssignmentStore> ConflictChecker<'a, A, S> {
    pub fn new(availability: &'a A, assignments: &'a S, ctx: &'a OrgContext) -> Self {
        Self {
            availability,
            assignments,
            ctx,
        }
    }

    /// First matching conflict for assigning the guide to
    /// `[starts_at, ends_at)`, or `None` when the assignment is feasible.
    ///
    /// Evaluation order, short-circuiting:
    /// 1. unavailable date override;
    /// 2. no weekly slot for the weekday (skipped when an available
    ///    override exists — overrides always beat the weekly pattern);
    /// 3. overlap with another confirmed run, half-open
    ///    (`assigned_start < ends_at && assigned_end > starts_at`),
    ///    ignoring `exclude_run`.
    pub fn check(
        &self,
        guide_id: &str,
        starts_at: NaiveDateTime,
        ends_at: NaiveDateTime,
        exclude_run: Option<&TourRunKey>,
    ) -> Result<Option<ConflictReason>> {
        if starts_at >= ends_at {
            return Err(Error::validation(format!(
                "window start {} must be before end {}",
                starts_at, ends_at
            )));
        }

        let date = starts_at.date();
        let run_override = self.availability.override_for(self.ctx, guide_id, date)?;

        if let Some(o) = &run_override {
            if !o.is_available {
                return Ok(Some(ConflictReason::UnavailableOnDate {
                    reason: o.reason.clone(),
                }));
            }
        }

        if run_override.is_none() {
            let dow = day_of_week(date);
            let slots = self.availability.weekly_slots(self.ctx, guide_id)?;
            if !slots
                .iter()
                .any(|slot| slot.day_of_week == dow && slot.is_available)
            {
                return Ok(Some(ConflictReason::NoWeeklySlot));
            }
        }

        let windows = self
            .assignments
            .confirmed_windows_for_guide(self.ctx, guide_id, date)?;
        for window in windows {
            if exclude_run.is_some_and(|key| *key == window.run) {
                continue;
            }
            if window.starts_at < ends_at && window.ends_at > starts_at {
                return Ok(Some(ConflictReason::OverlappingRun {
                    tour_name: window.tour_name,
                }));
            }
        }

        Ok(None)
    }
}
