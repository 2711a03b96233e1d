//! Dated planner events.
//!
//! This module defines [`DayEvent`], the unit the planner renders: one event
//! pinned to one calendar day, carrying the provenance (calendar name, color,
//! icon) of the subscription it came from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single highlightable event on one calendar day.
///
/// A multi-day source entry is represented as one `DayEvent` per covered day,
/// so every instance belongs to exactly one day and one calendar. Instances
/// are immutable once built; the store never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEvent {
    /// The day this event falls on.
    pub date: NaiveDate,
    /// The event title.
    pub summary: String,
    /// Name of the calendar this event came from.
    pub calendar: String,
    /// Highlight color inherited from the calendar, if any.
    pub color: Option<String>,
    /// Icon identifier inherited from the calendar, if any.
    pub icon: Option<String>,
    /// Whether the source entry was an all-day entry.
    pub all_day: bool,
}

impl DayEvent {
    /// Creates a new event with the given day, title, and calendar name.
    pub fn new(date: NaiveDate, summary: impl Into<String>, calendar: impl Into<String>) -> Self {
        Self {
            date,
            summary: summary.into(),
            calendar: calendar.into(),
            color: None,
            icon: None,
            all_day: false,
        }
    }

    /// Builder method to set the highlight color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Builder method to set the icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Builder method to set the all-day flag.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }
}
