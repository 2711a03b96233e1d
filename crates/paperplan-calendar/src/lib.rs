//! Calendar feed ingestion for the paperplan generator.
//!
//! This crate turns user-configured remote calendar feeds into a per-day
//! [`EventStore`](paperplan_core::EventStore) of highlightable events for
//! one target year:
//!
//! ```text
//! config.yaml ──▶ CalendarConfig
//!                      │ enabled sources
//!                      ▼
//!                 FeedFetcher ──▶ raw ICS text (TTL cache, retries)
//!                      │
//!                      ▼
//!                 parse_feed ──▶ FeedEntry::Dated ─────────▶ EventStore
//!                      │
//!                      └───────▶ FeedEntry::Recurring
//!                                      │ expand_recurring(Jan 1..Dec 31)
//!                                      ▼
//!                                 EventStore
//! ```
//!
//! Failure recovery is layered: a bad entry costs that entry, a bad feed or
//! URL costs that calendar, and anything escaping the stages costs the run,
//! which callers see as a plain "no calendar data" result.

pub mod config;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod pipeline;
pub mod recur;

pub use config::{CalendarConfig, CalendarSettings, CalendarSource};
pub use error::{CalendarError, CalendarErrorCode, CalendarResult};
pub use fetch::FeedFetcher;
pub use parse::{FeedEntry, ParseOptions, RecurringEvent, compile_patterns, parse_feed};
pub use pipeline::load_year;
pub use recur::expand_recurring;
