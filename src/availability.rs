//! Guide availability resolution.
//!
//! Two independent layers: a weekly recurring pattern (multiple slots per
//! weekday, never auto-merged) and date-specific overrides. An override
//! always wins for its date — an unavailable override blanks the whole day
//! no matter what the weekly pattern says.
//!
//! This module persists nothing; it is a pure query over the two tables
//! behind [`AvailabilityStore`].

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::context::OrgContext;
use crate::error::{Error, Result};
use crate::timeofday::{MINUTES_PER_DAY, TimeOfDay};
use crate::traits::AvailabilityStore;

/// One recurring slot in a guide's weekly pattern. `day_of_week` is 0-6
/// with 0 = Sunday, matching the upstream calendar convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySlot {
    pub day_of_week: u8,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub is_available: bool,
}

impl WeeklySlot {
    pub fn validate(&self) -> Result<()> {
        if self.day_of_week > 6 {
            return Err(Error::validation(format!(
                "day of week out of range: {}",
                self.day_of_week
            )));
        }
        if self.start >= self.end {
            return Err(Error::validation(format!(
                "weekly slot start {} must be before end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Validate a full-replacement set of weekly slots. "Set weekly
/// availability" replaces the guide's whole pattern, so the set is checked
/// as one unit before any write.
pub fn validate_weekly_slots(slots: &[WeeklySlot]) -> Result<()> {
    for slot in slots {
        slot.validate()?;
    }
    Ok(())
}

/// A date-specific exception to the weekly pattern. Custom hours are
/// both-or-neither; at most one override exists per guide per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOverride {
    pub date: NaiveDate,
    pub is_available: bool,
    pub start: Option<TimeOfDay>,
    pub end: Option<TimeOfDay>,
    pub reason: Option<String>,
}

impl DateOverride {
    pub fn validate(&self) -> Result<()> {
        match (self.start, self.end) {
            (None, None) => Ok(()),
            (Some(start), Some(end)) => {
                if start >= end {
                    Err(Error::validation(format!(
                        "override start {} must be before end {}",
                        start, end
                    )))
                } else {
                    Ok(())
                }
            }
            _ => Err(Error::validation(
                "override hours require both start and end",
            )),
        }
    }

    /// Custom hours for the day, when both ends are present.
    pub fn window(&self) -> Option<(TimeOfDay, TimeOfDay)> {
        self.start.zip(self.end)
    }
}

/// Reject a new override when one already exists for the same date.
/// Duplicates are a conflict, never an implicit upsert.
pub fn ensure_unique_override(existing: &[DateOverride], candidate: &DateOverride) -> Result<()> {
    if existing.iter().any(|o| o.date == candidate.date) {
        return Err(Error::conflict(format!(
            "an availability override already exists for {}",
            candidate.date
        )));
    }
    Ok(())
}

/// Which layer decided a day's availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilitySource {
    Override,
    Weekly,
    Default,
}

/// Resolved availability for one calendar day. `windows` is empty when
/// the day is available without specific hours (an override with no custom
/// hours) or not available at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateAvailability {
    pub date: NaiveDate,
    pub is_available: bool,
    pub windows: Vec<(TimeOfDay, TimeOfDay)>,
    pub source: AvailabilitySource,
}

/// Day-of-week index for a calendar date, 0 = Sunday.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Pure availability queries over the weekly/override tables.
pub struct AvailabilityResolver<'a, S: AvailabilityStore> {
    store: &'a S,
    ctx: &'a OrgContext,
}

impl<'a, S: AvailabilityStore> AvailabilityResolver<'a, S> {
    pub fn new(store: &'a S, ctx: &'a OrgContext) -> Self {
        Self { store, ctx }
    }

    /// Is the guide available at all on this date? An override decides
    /// outright; otherwise any available weekly slot for the weekday
    /// counts, ignoring time of day.
    pub fn is_available_on_date(&self, guide_id: &str, date: NaiveDate) -> Result<bool> {
        if let Some(o) = self.store.override_for(self.ctx, guide_id, date)? {
            return Ok(o.is_available);
        }

        let dow = day_of_week(date);
        let slots = self.store.weekly_slots(self.ctx, guide_id)?;
        Ok(slots
            .iter()
            .any(|slot| slot.day_of_week == dow && slot.is_available))
    }

    /// Is the guide available for the whole interval `[starts_at, ends_at)`?
    ///
    /// An unavailable override fails immediately. An available override
    /// with custom hours must contain the requested time-of-day range.
    /// Otherwise the range must fit inside at least one available weekly
    /// slot for that weekday.
    pub fn is_available_for_interval(
        &self,
        guide_id: &str,
        starts_at: NaiveDateTime,
        ends_at: NaiveDateTime,
    ) -> Result<bool> {
        if starts_at >= ends_at {
            return Err(Error::validation(format!(
                "interval start {} must be before end {}",
                starts_at, ends_at
            )));
        }

        let date = starts_at.date();
        let req_start = minutes_of(starts_at);
        // An interval running to midnight of the next day closes at 24:00.
        let req_end = if ends_at.date() > date {
            MINUTES_PER_DAY as u32
        } else {
            minutes_of(ends_at)
        };

        if let Some(o) = self.store.override_for(self.ctx, guide_id, date)? {
            if !o.is_available {
                return Ok(false);
            }
            if let Some((start, end)) = o.window() {
                return Ok(fits(req_start, req_end, start, end));
            }
            // Available all day, no custom hours.
            return Ok(true);
        }

        let dow = day_of_week(date);
        let slots = self.store.weekly_slots(self.ctx, guide_id)?;
        Ok(slots.iter().any(|slot| {
            slot.day_of_week == dow
                && slot.is_available
                && fits(req_start, req_end, slot.start, slot.end)
        }))
    }

    /// Per-day availability over `[from, to)`, one entry per calendar day.
    /// Resolution order per day: override, then weekly pattern, then
    /// unavailable.
    pub fn availability_for_range(
        &self,
        guide_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DateAvailability>> {
        if from >= to {
            return Err(Error::validation(format!(
                "range start {} must be before end {}",
                from, to
            )));
        }

        let slots = self.store.weekly_slots(self.ctx, guide_id)?;
        let mut days = Vec::with_capacity((to - from).num_days() as usize);
        let mut date = from;
        while date < to {
            days.push(self.resolve_day(guide_id, date, &slots)?);
            date += Duration::days(1);
        }
        Ok(days)
    }

    fn resolve_day(
        &self,
        guide_id: &str,
        date: NaiveDate,
        slots: &[WeeklySlot],
    ) -> Result<DateAvailability> {
        if let Some(o) = self.store.override_for(self.ctx, guide_id, date)? {
            let windows = if o.is_available {
                o.window().into_iter().collect()
            } else {
                Vec::new()
            };
            return Ok(DateAvailability {
                date,
                is_available: o.is_available,
                windows,
                source: AvailabilitySource::Override,
            });
        }

        let dow = day_of_week(date);
        let windows: Vec<(TimeOfDay, TimeOfDay)> = slots
            .iter()
            .filter(|slot| slot.day_of_week == dow && slot.is_available)
            .map(|slot| (slot.start, slot.end))
            .collect();

        if windows.is_empty() {
            Ok(DateAvailability {
                date,
                is_available: false,
                windows,
                source: AvailabilitySource::Default,
            })
        } else {
            Ok(DateAvailability {
                date,
                is_available: true,
                windows,
                source: AvailabilitySource::Weekly,
            })
        }
    }
}

fn minutes_of(at: NaiveDateTime) -> u32 {
    TimeOfDay::from_naive_time(at.time()).minutes() as u32
}

/// Does the requested `[req_start, req_end)` minute range fit inside the
/// slot `[start, end)`? Both ends are half-open, so a request ending
/// exactly when the slot ends still fits.
fn fits(req_start: u32, req_end: u32, start: TimeOfDay, end: TimeOfDay) -> bool {
    start.minutes() as u32 <= req_start && req_end <= end.minutes() as u32
}
