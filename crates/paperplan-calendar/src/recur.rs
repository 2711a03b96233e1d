//! Recurrence rule expansion.
//!
//! Expands one [`RecurringEvent`] marker into concrete events within a
//! closed date interval. Evaluation is bounded to the interval up front
//! rather than generating an unbounded sequence and filtering, so an
//! endless `FREQ=DAILY` rule costs one year of occurrences, not forever.

use chrono::{Duration, NaiveDate, NaiveTime};
use rrule::RRuleSet;
use tracing::debug;

use paperplan_core::DayEvent;

use crate::error::{CalendarError, CalendarResult};
use crate::parse::RecurringEvent;

/// Expands a recurring entry into one event per occurrence date within
/// `[range_start, range_end]`, both ends inclusive.
///
/// Occurrence events inherit the marker's summary and provenance. An empty
/// or reversed interval yields no events.
pub fn expand_recurring(
    recurring: &RecurringEvent,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> CalendarResult<Vec<DayEvent>> {
    if range_end < range_start {
        return Ok(Vec::new());
    }

    let rule = recurring.rule.trim();
    let rule = rule.strip_prefix("RRULE:").unwrap_or(rule);
    let set_text = format!(
        "DTSTART:{}T000000Z\nRRULE:{}",
        recurring.start.format("%Y%m%d"),
        rule
    );
    let rule_set: RRuleSet = set_text.parse().map_err(|e| {
        CalendarError::recurrence(format!("invalid recurrence rule '{}': {}", rule, e))
            .with_calendar(&recurring.calendar)
    })?;

    // after/before are exclusive bounds; a second of slack keeps both
    // interval ends inclusive (occurrences sit at midnight UTC).
    let after = (utc_midnight(range_start) - Duration::seconds(1)).with_timezone(&rrule::Tz::UTC);
    let before = (utc_midnight(range_end) + Duration::seconds(1)).with_timezone(&rrule::Tz::UTC);

    let span_days = (range_end - range_start).num_days() + 1;
    let limit = u16::try_from(span_days).unwrap_or(u16::MAX);
    let result = rule_set.after(after).before(before).all(limit);

    let mut events: Vec<DayEvent> = Vec::new();
    for occurrence in &result.dates {
        let date = occurrence.date_naive();
        // Sub-daily rules can hit the same day repeatedly; one event per day.
        if events.last().is_some_and(|prev| prev.date == date) {
            continue;
        }
        let mut event = DayEvent::new(date, &recurring.summary, &recurring.calendar)
            .with_all_day(recurring.all_day);
        if let Some(ref color) = recurring.color {
            event = event.with_color(color);
        }
        if let Some(ref icon) = recurring.icon {
            event = event.with_icon(icon);
        }
        events.push(event);
    }

    debug!(
        calendar = %recurring.calendar,
        rule = %rule,
        occurrences = events.len(),
        "Expanded recurring entry"
    );
    Ok(events)
}

fn utc_midnight(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
