use std::collections::HashSet;
use std::iter;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};

use crate::models::DoctorSchedule;

const SLOT_FORMAT: &str = "%H:%M";

/// Parses `HH:MM` or `HH:MM:SS`; anything else is `None`.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn format_slot(time: NaiveTime) -> String {
    time.format(SLOT_FORMAT).to_string()
}

/// Bookable slot start times for `reference_date`, chronological.
///
/// Slots step from `start_time` by `slot_duration_minutes` while the slot
/// start is before `end_time`. Booked times are skipped, the remainder is
/// capped at `max_slots_per_day`, and on the current day anything earlier
/// than `now` is dropped. Invalid schedules yield an empty list.
pub fn compute_slots(
    schedule: &DoctorSchedule,
    booked_times: &[String],
    reference_date: NaiveDate,
    now: NaiveDateTime,
) -> Vec<String> {
    if !schedule.is_active {
        debug!("Schedule for doctor {} is inactive", schedule.doctor_id);
        return Vec::new();
    }

    let (start, end) = match (
        parse_time_of_day(&schedule.start_time),
        parse_time_of_day(&schedule.end_time),
    ) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            warn!(
                "Malformed schedule times for doctor {}: {:?} - {:?}",
                schedule.doctor_id, schedule.start_time, schedule.end_time
            );
            return Vec::new();
        }
    };

    if schedule.slot_duration_minutes <= 0 || start >= end {
        return Vec::new();
    }

    let step = Duration::minutes(i64::from(schedule.slot_duration_minutes));
    let cap = schedule
        .max_slots_per_day
        .filter(|max| *max > 0)
        .map_or(usize::MAX, |max| max as usize);

    // Unparseable booked entries cannot collide with a generated slot.
    let booked: HashSet<NaiveTime> = booked_times
        .iter()
        .filter_map(|time| parse_time_of_day(time))
        .collect();

    let cutoff = (reference_date == now.date()).then(|| now.time());

    iter::successors(Some(start), |current| {
        let (next, wrapped) = current.overflowing_add_signed(step);
        (wrapped == 0 && next > *current).then_some(next)
    })
    .take_while(|slot| *slot < end)
    .filter(|slot| !booked.contains(slot))
    .take(cap)
    .filter(|slot| cutoff.map_or(true, |cutoff| *slot >= cutoff))
    .map(format_slot)
    .collect()
}

/// Drops slots that have already started when `reference_date` is today.
/// Used on server-provided lists, which stay authoritative otherwise.
pub fn filter_past_slots(slots: Vec<String>, reference_date: NaiveDate, now: NaiveDateTime) -> Vec<String> {
    if reference_date != now.date() {
        return slots;
    }

    let cutoff = now.time();
    slots
        .into_iter()
        .filter(|slot| parse_time_of_day(slot).map_or(false, |time| time >= cutoff))
        .collect()
}
