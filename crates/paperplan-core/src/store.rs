//! Capacity-bounded, per-day event storage.
//!
//! The store is built once per generator run: the ingestion pipeline inserts
//! events day by day, the rendering layer reads them back through the
//! month/week/day queries. Nothing is ever removed or rewritten.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::trace;

use crate::event::DayEvent;

/// Aggregate statistics over a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of stored events.
    pub total_events: usize,
    /// Number of distinct days holding at least one event.
    pub days_with_events: usize,
}

/// Per-day indexed collection of [`DayEvent`]s.
///
/// Each day's list keeps insertion order and is capped at
/// `max_events_per_day`. Events inserted once the cap is reached are silently
/// dropped, so earlier-processed calendars win the remaining slots for a
/// crowded day.
#[derive(Debug)]
pub struct EventStore {
    /// Maximum number of events kept per day.
    max_events_per_day: usize,
    /// Events keyed by day, insertion order within each day.
    days: BTreeMap<NaiveDate, Vec<DayEvent>>,
}

impl EventStore {
    /// Creates an empty store with the given per-day cap.
    pub fn new(max_events_per_day: usize) -> Self {
        Self {
            max_events_per_day,
            days: BTreeMap::new(),
        }
    }

    /// Returns the per-day cap.
    pub fn max_events_per_day(&self) -> usize {
        self.max_events_per_day
    }

    /// Inserts an event into its day's list.
    ///
    /// Once the day already holds `max_events_per_day` events the new event
    /// is dropped without error (first-come-first-kept).
    pub fn add_event(&mut self, event: DayEvent) {
        let slot = self.days.entry(event.date).or_default();
        if slot.len() >= self.max_events_per_day {
            trace!(
                date = %event.date,
                summary = %event.summary,
                cap = self.max_events_per_day,
                "Per-day cap reached, dropping event"
            );
            return;
        }
        slot.push(event);
    }

    /// Returns all stored events falling in the given month (1-12), any year,
    /// day order ascending and insertion order within a day.
    pub fn events_for_month(&self, month: u32) -> Vec<&DayEvent> {
        self.days
            .iter()
            .filter(|(date, _)| date.month() == month)
            .flat_map(|(_, events)| events.iter())
            .collect()
    }

    /// Returns all stored events in the given week.
    ///
    /// Week `n` covers the seven days starting `week_one_start + 7 * (n - 1)`;
    /// `week_one_start` is the first day (normally the Monday) of week 1.
    /// Week numbers below 1 return nothing.
    pub fn events_for_week(&self, week_number: u32, week_one_start: NaiveDate) -> Vec<&DayEvent> {
        if week_number == 0 {
            return Vec::new();
        }
        let start = week_one_start + Duration::days(7 * (i64::from(week_number) - 1));
        let end = start + Duration::days(7);
        self.days
            .range(start..end)
            .flat_map(|(_, events)| events.iter())
            .collect()
    }

    /// Returns the first stored event for the given day, if any.
    pub fn event_for_day(&self, date: NaiveDate) -> Option<&DayEvent> {
        self.days.get(&date).and_then(|events| events.first())
    }

    /// Returns all stored events for the given day.
    pub fn events_for_day(&self, date: NaiveDate) -> &[DayEvent] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns aggregate statistics over the store.
    pub fn statistics(&self) -> StoreStats {
        StoreStats {
            total_events: self.days.values().map(Vec::len).sum(),
            days_with_events: self.days.values().filter(|events| !events.is_empty()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_event(date: NaiveDate, summary: &str) -> DayEvent {
        DayEvent::new(date, summary, "test")
    }

    #[test]
    fn add_and_query_day() {
        let mut store = EventStore::new(4);
        store.add_event(make_event(day(2025, 3, 14), "Pi Day"));

        let first = store.event_for_day(day(2025, 3, 14)).unwrap();
        assert_eq!(first.summary, "Pi Day");
        assert!(store.event_for_day(day(2025, 3, 15)).is_none());
    }

    #[test]
    fn cap_keeps_first_inserted() {
        let mut store = EventStore::new(2);
        let date = day(2025, 6, 1);
        store.add_event(make_event(date, "first"));
        store.add_event(make_event(date, "second"));
        store.add_event(make_event(date, "third"));
        store.add_event(make_event(date, "fourth"));

        let events = store.events_for_day(date);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].summary, "first");
        assert_eq!(events[1].summary, "second");
    }

    #[test]
    fn readding_stored_events_never_exceeds_cap() {
        let mut store = EventStore::new(3);
        let date = day(2025, 6, 1);
        let event = make_event(date, "repeat");
        for _ in 0..10 {
            store.add_event(event.clone());
        }

        assert_eq!(store.events_for_day(date).len(), 3);
    }

    #[test]
    fn cap_is_per_day() {
        let mut store = EventStore::new(1);
        store.add_event(make_event(day(2025, 6, 1), "a"));
        store.add_event(make_event(day(2025, 6, 2), "b"));

        assert_eq!(store.statistics().total_events, 2);
    }

    #[test]
    fn events_for_month_filters_and_orders() {
        let mut store = EventStore::new(4);
        store.add_event(make_event(day(2025, 2, 20), "late feb"));
        store.add_event(make_event(day(2025, 2, 3), "early feb"));
        store.add_event(make_event(day(2025, 3, 1), "march"));

        let feb = store.events_for_month(2);
        assert_eq!(feb.len(), 2);
        assert_eq!(feb[0].summary, "early feb");
        assert_eq!(feb[1].summary, "late feb");
        assert_eq!(store.events_for_month(3).len(), 1);
        assert!(store.events_for_month(4).is_empty());
    }

    #[test]
    fn events_for_week_window() {
        // 2025-01-06 is the first Monday of 2025.
        let week_one = day(2025, 1, 6);
        let mut store = EventStore::new(4);
        store.add_event(make_event(day(2025, 1, 6), "week1 monday"));
        store.add_event(make_event(day(2025, 1, 12), "week1 sunday"));
        store.add_event(make_event(day(2025, 1, 13), "week2 monday"));

        let week1 = store.events_for_week(1, week_one);
        assert_eq!(week1.len(), 2);
        let week2 = store.events_for_week(2, week_one);
        assert_eq!(week2.len(), 1);
        assert_eq!(week2[0].summary, "week2 monday");
        assert!(store.events_for_week(0, week_one).is_empty());
        assert!(store.events_for_week(3, week_one).is_empty());
    }

    #[test]
    fn statistics_counts_events_and_days() {
        let mut store = EventStore::new(4);
        assert_eq!(store.statistics().total_events, 0);
        assert_eq!(store.statistics().days_with_events, 0);

        store.add_event(make_event(day(2025, 5, 1), "a"));
        store.add_event(make_event(day(2025, 5, 1), "b"));
        store.add_event(make_event(day(2025, 5, 2), "c"));

        let stats = store.statistics();
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.days_with_events, 2);
    }

    #[test]
    fn zero_cap_stores_nothing() {
        let mut store = EventStore::new(0);
        store.add_event(make_event(day(2025, 5, 1), "dropped"));

        assert_eq!(store.statistics().total_events, 0);
    }
}
