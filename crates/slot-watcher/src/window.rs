//! Flattening a raw schedule into slots and picking the ones worth reporting.

use chrono::{Duration, NaiveDateTime};
use slot_types::{ScheduleOfDay, Slot};

/// All slots of a schedule, in day -> slot group -> slot order.
pub fn extract_slots(days: &[ScheduleOfDay]) -> Vec<Slot> {
    days.iter()
        .flat_map(|day| day.schedule_by_slot.iter())
        .flat_map(|group| group.slot.iter())
        .filter_map(|entry| match Slot::parse_start_time(&entry.start_time) {
            Ok(slot) => Some(slot),
            Err(e) => {
                tracing::warn!("Skipping slot: {}", e);
                None
            }
        })
        .collect()
}

/// The earliest slot of a schedule regardless of traversal order.
pub fn earliest_slot(days: &[ScheduleOfDay]) -> Option<Slot> {
    extract_slots(days).into_iter().min()
}

/// Whether `slot` starts within the next `catch_within_days` days.
///
/// A slot qualifies once `start - catch_within_days <= now` (inclusive), and
/// stops qualifying once it has started.
pub fn is_in_window(slot: &Slot, catch_within_days: i64, now: NaiveDateTime) -> bool {
    slot.start >= now && slot.start - Duration::days(catch_within_days) <= now
}

/// Slots of `days` that fall inside the notification window, traversal order kept.
pub fn find_slots(days: &[ScheduleOfDay], catch_within_days: i64, now: NaiveDateTime) -> Vec<Slot> {
    extract_slots(days)
        .into_iter()
        .filter(|slot| is_in_window(slot, catch_within_days, now))
        .collect()
}
