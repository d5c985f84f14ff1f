use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{ConfirmationWindow, WindowPhase};
use crate::services::slots::parse_time_of_day;

pub const OPENS_BEFORE_MINUTES: i64 = 20;
pub const CLOSES_AFTER_MINUTES: i64 = 15;

/// Arrival-confirmation window around an appointment: 20 minutes before to
/// 15 minutes after, both bounds inclusive. Only open on the appointment's
/// own date. A malformed appointment time has no window at all.
pub fn compute_confirmation_window(
    appointment_time: &str,
    reference_date: NaiveDate,
    now: NaiveDateTime,
) -> Option<ConfirmationWindow> {
    let appointment = reference_date.and_time(parse_time_of_day(appointment_time)?);
    let start = appointment - Duration::minutes(OPENS_BEFORE_MINUTES);
    let end = appointment + Duration::minutes(CLOSES_AFTER_MINUTES);

    let phase = if reference_date != now.date() {
        WindowPhase::NotToday
    } else if now < start {
        WindowPhase::Upcoming
    } else if now > end {
        WindowPhase::Passed
    } else {
        WindowPhase::Open
    };

    Some(ConfirmationWindow {
        start,
        end,
        is_open: phase == WindowPhase::Open,
        phase,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        today().and_hms_opt(h, m, 0).unwrap()
    }

    fn is_open(now: NaiveDateTime) -> bool {
        compute_confirmation_window("10:00", today(), now).unwrap().is_open
    }

    #[test]
    fn open_from_twenty_before_to_fifteen_after() {
        assert!(is_open(at(9, 41)));
        assert!(!is_open(at(9, 39)));
        assert!(!is_open(at(10, 16)));
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(is_open(at(9, 40)));
        assert!(is_open(at(10, 15)));
        assert!(!is_open(today().and_hms_opt(10, 15, 1).unwrap()));
    }

    #[test]
    fn window_edges_are_reported() {
        let window = compute_confirmation_window("10:00:00", today(), at(10, 0)).unwrap();
        assert_eq!(window.start, at(9, 40));
        assert_eq!(window.end, at(10, 15));
        assert_eq!(window.phase, WindowPhase::Open);
        assert_eq!(window.message(), None);
    }

    #[test]
    fn other_dates_are_never_open() {
        let tomorrow = NaiveDate::from_ymd_opt(2024, 6, 13).unwrap();
        for (h, m) in [(0, 0), (9, 50), (10, 0), (23, 59)] {
            let window = compute_confirmation_window("10:00", tomorrow, at(h, m)).unwrap();
            assert!(!window.is_open);
            assert_eq!(window.phase, WindowPhase::NotToday);
        }
    }

    #[test]
    fn phases_drive_messages() {
        let early = compute_confirmation_window("10:00", today(), at(9, 0)).unwrap();
        assert_eq!(early.phase, WindowPhase::Upcoming);
        assert_eq!(early.message().as_deref(), Some("You can confirm arrival starting from 9:40 AM"));

        let late = compute_confirmation_window("10:00", today(), at(11, 0)).unwrap();
        assert_eq!(late.phase, WindowPhase::Passed);
        assert_eq!(late.message().as_deref(), Some("Your confirmation window has passed."));
    }

    #[test]
    fn malformed_time_has_no_window() {
        assert!(compute_confirmation_window("", today(), at(10, 0)).is_none());
        assert!(compute_confirmation_window("25:00", today(), at(10, 0)).is_none());
    }

    #[test]
    fn identical_inputs_give_identical_windows() {
        let a = compute_confirmation_window("14:30", today(), at(14, 20));
        let b = compute_confirmation_window("14:30", today(), at(14, 20));
        assert_eq!(a, b);
    }
}
