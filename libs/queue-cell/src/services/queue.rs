use std::cmp::Ordering;

use schedule_cell::parse_time_of_day;

use crate::models::LiveQueueEntry;

/// Sorts the way the clinic floor sees the queue: status priority, then slot
/// time with walk-ins after booked slots, then arrival order. Inactive
/// entries are dropped.
pub fn order_live_queue(mut entries: Vec<LiveQueueEntry>) -> Vec<LiveQueueEntry> {
    entries.retain(|entry| entry.status.is_active());
    entries.sort_by(compare_entries);
    entries
}

fn compare_entries(a: &LiveQueueEntry, b: &LiveQueueEntry) -> Ordering {
    let slot = |entry: &LiveQueueEntry| entry.appointment_time.as_deref().and_then(parse_time_of_day);

    a.status.queue_priority()
        .cmp(&b.status.queue_priority())
        .then_with(|| match (slot(a), slot(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Number of active tokens ahead of `token_id`, or `None` if it is not queued.
pub fn queue_position(entries: &[LiveQueueEntry], token_id: i64) -> Option<usize> {
    let ordered = order_live_queue(entries.to_vec());
    ordered.iter().position(|entry| entry.id == token_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenStatus;
    use chrono::{TimeZone, Utc};

    fn entry(id: i64, status: TokenStatus, time: Option<&str>, minute: u32) -> LiveQueueEntry {
        LiveQueueEntry {
            id,
            token_number: None,
            status,
            appointment_time: time.map(str::to_string),
            created_at: Some(Utc.with_ymd_and_hms(2024, 6, 12, 8, minute, 0).unwrap()),
        }
    }

    #[test]
    fn ordering_follows_status_then_slot_then_arrival() {
        let entries = vec![
            entry(1, TokenStatus::Waiting, None, 1),
            entry(2, TokenStatus::Waiting, Some("09:30:00"), 2),
            entry(3, TokenStatus::Confirmed, Some("10:00"), 3),
            entry(4, TokenStatus::InConsultancy, Some("09:00"), 4),
            entry(5, TokenStatus::Waiting, Some("09:15"), 5),
            entry(6, TokenStatus::Waiting, None, 0),
            entry(7, TokenStatus::Completed, Some("08:45"), 0),
        ];

        let ids: Vec<i64> = order_live_queue(entries).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 3, 5, 2, 6, 1]);
    }

    #[test]
    fn position_counts_people_ahead() {
        let entries = vec![
            entry(10, TokenStatus::Waiting, Some("09:30"), 0),
            entry(11, TokenStatus::InConsultancy, Some("09:00"), 0),
            entry(12, TokenStatus::Cancelled, Some("09:15"), 0),
        ];

        assert_eq!(queue_position(&entries, 11), Some(0));
        assert_eq!(queue_position(&entries, 10), Some(1));
        assert_eq!(queue_position(&entries, 12), None);
    }
}
