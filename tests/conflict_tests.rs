//! Conflict checker tests: evaluation order and overlap boundaries.

mod fixtures;

use tour_dispatch::conflict::{ConflictChecker, ConflictReason};
use tour_dispatch::error::Error;

use fixtures::{
    Backoffice, assignment, at, ctx, custom_hours, day_off, guide, run_key, tour_run, weekly,
};

// 2026-08-31 is a Monday (day_of_week 1).
const MONDAY: &str = "2026-08-31";

/// Guide with a Monday pattern and one confirmed run 09:00-11:00.
fn office_with_morning_run() -> Backoffice {
    let key = run_key("marina-cruise", MONDAY, "09:00");
    Backoffice::new()
        .with_guide(guide("amira", 6))
        .with_weekly("amira", vec![weekly(1, "08:00", "18:00")])
        .with_run(tour_run("marina-cruise", MONDAY, "09:00", 120))
        .with_assignment(assignment("a1", "b1", Some("amira"), &key, 0, 2))
}

#[test]
fn touching_windows_do_not_conflict() {
    let office = office_with_morning_run();
    let ctx = ctx();
    let checker = ConflictChecker::new(&office, &office, &ctx);

    // Existing run occupies [09:00, 11:00); a run starting 11:00 touches
    // but does not overlap.
    let conflict = checker
        .check("amira", at(MONDAY, "11:00"), at(MONDAY, "13:00"), None)
        .unwrap();
    assert_eq!(conflict, None);
}

#[test]
fn one_minute_of_overlap_conflicts() {
    let office = office_with_morning_run();
    let ctx = ctx();
    let checker = ConflictChecker::new(&office, &office, &ctx);

    let conflict = checker
        .check("amira", at(MONDAY, "10:59"), at(MONDAY, "13:00"), None)
        .unwrap();
    assert_eq!(
        conflict,
        Some(ConflictReason::OverlappingRun {
            tour_name: "marina-cruise".to_string()
        })
    );
}

#[test]
fn the_run_itself_is_excluded_from_overlap() {
    let office = office_with_morning_run();
    let ctx = ctx();
    let checker = ConflictChecker::new(&office, &office, &ctx);
    let key = run_key("marina-cruise", MONDAY, "09:00");

    let conflict = checker
        .check("amira", at(MONDAY, "09:00"), at(MONDAY, "11:00"), Some(&key))
        .unwrap();
    assert_eq!(conflict, None);
}

#[test]
fn unavailable_override_wins_and_carries_its_reason() {
    let office = office_with_morning_run()
        .with_override("amira", day_off(MONDAY, Some("visa appointment")));
    let ctx = ctx();
    let checker = ConflictChecker::new(&office, &office, &ctx);

    let conflict = checker
        .check("amira", at(MONDAY, "14:00"), at(MONDAY, "16:00"), None)
        .unwrap();
    assert_eq!(
        conflict,
        Some(ConflictReason::UnavailableOnDate {
            reason: Some("visa appointment".to_string())
        })
    );
}

#[test]
fn missing_weekly_slot_is_a_day_presence_check() {
    let office = office_with_morning_run();
    let ctx = ctx();
    let checker = ConflictChecker::new(&office, &office, &ctx);

    // Tuesday has no slot at all.
    let conflict = checker
        .check("amira", at("2026-09-01", "09:00"), at("2026-09-01", "11:00"), None)
        .unwrap();
    assert_eq!(conflict, Some(ConflictReason::NoWeeklySlot));

    // A window outside the Monday slot's hours still passes here: only
    // day presence is checked, not time of day.
    let late = checker
        .check("amira", at(MONDAY, "19:00"), at(MONDAY, "21:00"), None)
        .unwrap();
    assert_eq!(late, None);
}

#[test]
fn available_override_opens_a_day_without_weekly_slots() {
    // No Tuesday slot, but an override makes the guide available.
    let office = office_with_morning_run()
        .with_override("amira", custom_hours("2026-09-01", "09:00", "17:00"));
    let ctx = ctx();
    let checker = ConflictChecker::new(&office, &office, &ctx);

    let conflict = checker
        .check("amira", at("2026-09-01", "10:00"), at("2026-09-01", "12:00"), None)
        .unwrap();
    assert_eq!(conflict, None);
}

#[test]
fn rejects_inverted_windows() {
    let office = office_with_morning_run();
    let ctx = ctx();
    let checker = ConflictChecker::new(&office, &office, &ctx);

    let result = checker.check("amira", at(MONDAY, "12:00"), at(MONDAY, "10:00"), None);
    assert!(matches!(result, Err(Error::Validation(_))));
}
