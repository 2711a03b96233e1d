//! iCalendar feed parsing.
//!
//! This module turns raw feed text into the pipeline's working currency:
//! concrete [`DayEvent`]s for plainly dated entries, and [`RecurringEvent`]
//! markers for entries carrying an RRULE, whose expansion is deferred to the
//! orchestrator. Only the subset of RFC 5545 the planner needs is read:
//! start/end values, summaries, and the raw recurrence rule.

use chrono::{Datelike, NaiveDate};
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, EventLike};
use regex::Regex;
use tracing::{debug, warn};

use paperplan_core::DayEvent;

use crate::config::CalendarSource;

/// One parsed feed entry.
///
/// Plainly dated entries come out as `Dated` (one per covered day);
/// recurring entries come out as a single `Recurring` marker so the
/// orchestrator can expand them against the year's bounds in one pass.
#[derive(Debug, Clone)]
pub enum FeedEntry {
    /// A concrete event on one day.
    Dated(DayEvent),
    /// A recurring entry awaiting expansion.
    Recurring(RecurringEvent),
}

/// A recurring feed entry, kept un-expanded.
///
/// Carries the raw rule plus the same provenance a [`DayEvent`] would get,
/// minus a date. Never stored directly; the orchestrator expands and
/// discards it.
#[derive(Debug, Clone)]
pub struct RecurringEvent {
    /// The raw RRULE value, e.g. `FREQ=DAILY`.
    pub rule: String,
    /// The series start date (DTSTART normalized to a day).
    pub start: NaiveDate,
    /// The entry title.
    pub summary: String,
    /// Name of the calendar this entry came from.
    pub calendar: String,
    /// Highlight color inherited from the calendar.
    pub color: Option<String>,
    /// Icon identifier inherited from the calendar.
    pub icon: Option<String>,
    /// Whether the source entry was all-day.
    pub all_day: bool,
}

/// Per-run parsing switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Skip entries whose start value is a pure date.
    pub skip_all_day: bool,
    /// Keep only days falling in this year, when set.
    pub target_year: Option<i32>,
}

/// Compiles exclusion patterns, dropping (and logging) any that fail.
///
/// Exclusion is best-effort by design: a broken pattern must never take the
/// whole feed down with it.
pub fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Ignoring invalid exclusion pattern");
                None
            }
        })
        .collect()
}

/// Parses feed text into dated events and recurring markers.
///
/// A feed that fails to parse as a whole yields an empty list (logged,
/// never propagated); malformed or filtered entries are skipped
/// individually.
pub fn parse_feed(
    text: &str,
    source: &CalendarSource,
    options: ParseOptions,
    exclude: &[Regex],
) -> Vec<FeedEntry> {
    let calendar = match text.parse::<Calendar>() {
        Ok(calendar) => calendar,
        Err(e) => {
            warn!(calendar = %source.name, error = %e, "Failed to parse calendar feed");
            return Vec::new();
        }
    };

    calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            _ => None,
        })
        .flat_map(|event| parse_entry(event, source, options, exclude))
        .collect()
}

/// Parses a single VEVENT, applying the summary/exclusion/all-day filters.
fn parse_entry(
    event: &icalendar::Event,
    source: &CalendarSource,
    options: ParseOptions,
    exclude: &[Regex],
) -> Vec<FeedEntry> {
    let Some(summary) = event.get_summary() else {
        debug!(calendar = %source.name, "Skipping entry without summary");
        return Vec::new();
    };

    if exclude.iter().any(|re| re.is_match(summary)) {
        debug!(calendar = %source.name, summary = %summary, "Entry excluded by pattern");
        return Vec::new();
    }

    let Some(start_value) = event.get_start() else {
        debug!(calendar = %source.name, summary = %summary, "Skipping entry without start");
        return Vec::new();
    };
    let all_day = matches!(start_value, DatePerhapsTime::Date(_));
    if all_day && options.skip_all_day {
        debug!(calendar = %source.name, summary = %summary, "Skipping all-day entry");
        return Vec::new();
    }
    let start = to_naive_date(start_value);

    if let Some(rule) = event.property_value("RRULE") {
        return vec![FeedEntry::Recurring(RecurringEvent {
            rule: rule.to_string(),
            start,
            summary: summary.to_string(),
            calendar: source.name.clone(),
            color: source.color.clone(),
            icon: source.icon.clone(),
            all_day,
        })];
    }

    let end = event.get_end().map(to_naive_date);
    covered_days(start, end)
        .into_iter()
        .filter(|day| options.target_year.is_none_or(|year| day.year() == year))
        .map(|day| {
            FeedEntry::Dated(provenance_event(day, summary, source, all_day))
        })
        .collect()
}

/// Builds a [`DayEvent`] inheriting the calendar's provenance.
fn provenance_event(
    date: NaiveDate,
    summary: &str,
    source: &CalendarSource,
    all_day: bool,
) -> DayEvent {
    let mut event = DayEvent::new(date, summary, &source.name).with_all_day(all_day);
    if let Some(ref color) = source.color {
        event = event.with_color(color);
    }
    if let Some(ref icon) = source.icon {
        event = event.with_icon(icon);
    }
    event
}

/// The calendar days an entry covers: the single start day, or every day in
/// `[start, end)` for a multi-day entry. An end at or before the start
/// degrades to the single start day.
fn covered_days(start: NaiveDate, end: Option<NaiveDate>) -> Vec<NaiveDate> {
    match end {
        Some(end) if end > start => start.iter_days().take_while(|day| *day < end).collect(),
        _ => vec![start],
    }
}

/// Normalizes any iCalendar temporal value to a plain calendar date.
///
/// Zoned and floating datetimes keep their wall-clock date; the planner
/// only cares which day a value falls on.
fn to_naive_date(value: DatePerhapsTime) -> NaiveDate {
    match value {
        DatePerhapsTime::Date(date) => date,
        DatePerhapsTime::DateTime(dt) => match dt {
            CalendarDateTime::Utc(dt) => dt.date_naive(),
            CalendarDateTime::Floating(naive) => naive.date(),
            CalendarDateTime::WithTimezone { date_time, tzid: _ } => date_time.date(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> CalendarSource {
        CalendarSource {
            name: "team".to_string(),
            url: "https://example.com/team.ics".to_string(),
            color: Some("#3366cc".to_string()),
            icon: None,
            enabled: true,
        }
    }

    fn wrap_events(body: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n{}END:VCALENDAR\r\n",
            body
        )
    }

    fn timed_event(summary: &str) -> String {
        format!(
            "BEGIN:VEVENT\r\nUID:t@example.com\r\nDTSTART:20250205T100000Z\r\nDTEND:20250205T110000Z\r\nSUMMARY:{}\r\nEND:VEVENT\r\n",
            summary
        )
    }

    #[test]
    fn single_day_entry() {
        let feed = wrap_events(&timed_event("Team Meeting"));
        let entries = parse_feed(&feed, &source(), ParseOptions::default(), &[]);

        assert_eq!(entries.len(), 1);
        let FeedEntry::Dated(event) = &entries[0] else {
            panic!("expected dated entry");
        };
        assert_eq!(event.summary, "Team Meeting");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 2, 5).unwrap());
        assert_eq!(event.calendar, "team");
        assert_eq!(event.color, Some("#3366cc".to_string()));
        assert!(!event.all_day);
    }

    #[test]
    fn multi_day_entry_yields_one_event_per_day() {
        // [Jan 1, Jan 4): three days.
        let feed = wrap_events(
            "BEGIN:VEVENT\r\nUID:m@example.com\r\nDTSTART;VALUE=DATE:20250101\r\nDTEND;VALUE=DATE:20250104\r\nSUMMARY:Conference\r\nEND:VEVENT\r\n",
        );
        let entries = parse_feed(&feed, &source(), ParseOptions::default(), &[]);

        assert_eq!(entries.len(), 3);
        for (offset, entry) in entries.iter().enumerate() {
            let FeedEntry::Dated(event) = entry else {
                panic!("expected dated entry");
            };
            assert_eq!(event.summary, "Conference");
            assert_eq!(event.calendar, "team");
            assert_eq!(
                event.date,
                NaiveDate::from_ymd_opt(2025, 1, 1 + offset as u32).unwrap()
            );
        }
    }

    #[test]
    fn multi_day_entry_is_clipped_to_target_year() {
        // [Dec 30 2024, Jan 2 2025) covers Dec 30, Dec 31, Jan 1.
        let feed = wrap_events(
            "BEGIN:VEVENT\r\nUID:y@example.com\r\nDTSTART;VALUE=DATE:20241230\r\nDTEND;VALUE=DATE:20250102\r\nSUMMARY:Break\r\nEND:VEVENT\r\n",
        );
        let options = ParseOptions {
            target_year: Some(2025),
            ..Default::default()
        };
        let entries = parse_feed(&feed, &source(), options, &[]);

        assert_eq!(entries.len(), 1);
        let FeedEntry::Dated(event) = &entries[0] else {
            panic!("expected dated entry");
        };
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn entry_without_summary_is_skipped() {
        let feed = wrap_events(
            "BEGIN:VEVENT\r\nUID:n@example.com\r\nDTSTART:20250205T100000Z\r\nEND:VEVENT\r\n",
        );
        let entries = parse_feed(&feed, &source(), ParseOptions::default(), &[]);
        assert!(entries.is_empty());
    }

    #[test]
    fn excluded_summary_is_skipped() {
        let feed = wrap_events(&timed_event("Team Lunch (cancelled)"));
        let exclude = compile_patterns(&["cancelled".to_string()]);
        let entries = parse_feed(&feed, &source(), ParseOptions::default(), &exclude);
        assert!(entries.is_empty());
    }

    #[test]
    fn invalid_pattern_is_dropped_and_never_excludes() {
        let exclude = compile_patterns(&["([unclosed".to_string(), "cancelled".to_string()]);
        assert_eq!(exclude.len(), 1);

        let feed = wrap_events(&timed_event("Team Meeting"));
        let entries = parse_feed(&feed, &source(), ParseOptions::default(), &exclude);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn all_day_entries_are_skipped_when_configured() {
        let feed = wrap_events(
            "BEGIN:VEVENT\r\nUID:a@example.com\r\nDTSTART;VALUE=DATE:20250210\r\nDTEND;VALUE=DATE:20250211\r\nSUMMARY:Holiday\r\nEND:VEVENT\r\n",
        );
        let options = ParseOptions {
            skip_all_day: true,
            ..Default::default()
        };
        assert!(parse_feed(&feed, &source(), options, &[]).is_empty());

        let kept = parse_feed(&feed, &source(), ParseOptions::default(), &[]);
        assert_eq!(kept.len(), 1);
        let FeedEntry::Dated(event) = &kept[0] else {
            panic!("expected dated entry");
        };
        assert!(event.all_day);
    }

    #[test]
    fn recurring_entry_yields_a_marker() {
        let feed = wrap_events(
            "BEGIN:VEVENT\r\nUID:r@example.com\r\nDTSTART:20250101T090000Z\r\nRRULE:FREQ=WEEKLY;BYDAY=MO\r\nSUMMARY:Standup\r\nEND:VEVENT\r\n",
        );
        let entries = parse_feed(&feed, &source(), ParseOptions::default(), &[]);

        assert_eq!(entries.len(), 1);
        let FeedEntry::Recurring(marker) = &entries[0] else {
            panic!("expected recurring marker");
        };
        assert_eq!(marker.rule, "FREQ=WEEKLY;BYDAY=MO");
        assert_eq!(marker.start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(marker.summary, "Standup");
        assert_eq!(marker.calendar, "team");
        assert!(!marker.all_day);
    }

    #[test]
    fn malformed_feed_yields_empty_list() {
        let entries = parse_feed("this is not a calendar", &source(), ParseOptions::default(), &[]);
        assert!(entries.is_empty());
    }

    #[test]
    fn zoned_datetime_normalizes_to_wall_clock_date() {
        let feed = wrap_events(
            "BEGIN:VEVENT\r\nUID:z@example.com\r\nDTSTART;TZID=America/New_York:20250314T230000\r\nSUMMARY:Late Show\r\nEND:VEVENT\r\n",
        );
        let entries = parse_feed(&feed, &source(), ParseOptions::default(), &[]);

        assert_eq!(entries.len(), 1);
        let FeedEntry::Dated(event) = &entries[0] else {
            panic!("expected dated entry");
        };
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    }

    #[test]
    fn end_before_start_degrades_to_single_day() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();
        assert_eq!(covered_days(start, Some(end)), vec![start]);
        assert_eq!(covered_days(start, Some(start)), vec![start]);
        assert_eq!(covered_days(start, None), vec![start]);
    }
}
