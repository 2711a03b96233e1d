//! The ingestion orchestrator.
//!
//! One call per requested year: load configuration, fetch and parse every
//! enabled calendar (deferring recurring markers), expand the markers
//! against the year's bounds, and hand back the populated store. "No
//! calendar data" is a normal outcome for the caller, not an error: the
//! planner renders fine with nothing highlighted.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use paperplan_core::EventStore;

use crate::config::CalendarConfig;
use crate::error::{CalendarError, CalendarResult};
use crate::fetch::FeedFetcher;
use crate::parse::{self, FeedEntry, ParseOptions, RecurringEvent};
use crate::recur::expand_recurring;

/// Loads every enabled calendar feed for the requested year.
///
/// Returns `None` when the subsystem is unconfigured, has no enabled
/// calendars, or the run failed outright; all three are logged and the
/// caller treats them the same way. Calendars are processed one after
/// another and a single calendar's failure only costs its own events.
pub async fn load_year(config_path: &Path, year: i32) -> Option<EventStore> {
    match run(config_path, year).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Calendar ingestion failed");
            None
        }
    }
}

async fn run(config_path: &Path, year: i32) -> CalendarResult<Option<EventStore>> {
    // Load.
    let Some(config) = CalendarConfig::load(config_path)? else {
        info!(
            path = %config_path.display(),
            "No calendar configuration, skipping calendar integration"
        );
        return Ok(None);
    };
    let sources = config.enabled_sources();
    if sources.is_empty() {
        info!("No enabled calendars configured, skipping calendar integration");
        return Ok(None);
    }
    info!(calendars = sources.len(), year, "Loading calendar events");

    let fetcher = FeedFetcher::new(&config.settings)?;
    let patterns = parse::compile_patterns(&config.settings.exclude_patterns);
    let options = ParseOptions {
        skip_all_day: config.settings.skip_all_day,
        target_year: Some(year),
    };

    // Fetch + parse, calendar by calendar.
    let mut store = EventStore::new(config.settings.max_events_per_day);
    let mut deferred: Vec<RecurringEvent> = Vec::new();
    for &source in &sources {
        // Fetch failures are logged inside the fetcher.
        let Some(text) = fetcher.fetch(&source.url, &source.name).await else {
            continue;
        };

        let mut dated = 0usize;
        let mut recurring = 0usize;
        for entry in parse::parse_feed(&text, source, options, &patterns) {
            match entry {
                FeedEntry::Dated(event) => {
                    store.add_event(event);
                    dated += 1;
                }
                FeedEntry::Recurring(marker) => {
                    deferred.push(marker);
                    recurring += 1;
                }
            }
        }
        info!(
            calendar = %source.name,
            events = dated,
            recurring,
            "Parsed calendar feed"
        );
    }

    // Expand deferred markers against the year's bounds.
    let range_start = year_day(year, 1, 1)?;
    let range_end = year_day(year, 12, 31)?;
    let mut occurrences = 0usize;
    for marker in &deferred {
        match expand_recurring(marker, range_start, range_end) {
            Ok(events) => {
                occurrences += events.len();
                for event in events {
                    store.add_event(event);
                }
            }
            Err(e) => {
                warn!(calendar = %marker.calendar, error = %e, "Failed to expand recurring entry");
            }
        }
    }
    if !deferred.is_empty() {
        info!(
            markers = deferred.len(),
            occurrences,
            "Expanded recurring entries"
        );
    }

    // Report.
    let stats = store.statistics();
    info!(
        total_events = stats.total_events,
        days_with_events = stats.days_with_events,
        "Calendar ingestion complete"
    );
    Ok(Some(store))
}

fn year_day(year: i32, month: u32, day: u32) -> CalendarResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| CalendarError::configuration(format!("invalid target year {}", year)))
}
