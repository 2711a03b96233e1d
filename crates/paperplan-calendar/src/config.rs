//! Calendar subsystem configuration.
//!
//! The configuration resource is a YAML file listing calendar subscriptions
//! plus pipeline-wide tuning. All tuning values have working defaults, so a
//! file containing only a `calendars:` list is valid. An absent file is not
//! an error: it disables the subsystem for the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CalendarError, CalendarResult};

/// One configured calendar subscription.
///
/// Built once by [`CalendarConfig::load`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSource {
    /// Display name, also used as event provenance.
    pub name: String,
    /// Feed URL (HTTP or HTTPS).
    pub url: String,
    /// Highlight color for events from this calendar.
    #[serde(default)]
    pub color: Option<String>,
    /// Icon identifier for events from this calendar.
    #[serde(default)]
    pub icon: Option<String>,
    /// Whether this calendar is fetched at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Pipeline-wide tuning parameters, immutable for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Whether fetched feeds are cached on disk.
    pub cache_enabled: bool,
    /// Directory holding cached feed files.
    pub cache_dir: PathBuf,
    /// Maximum age of a cache entry before a re-fetch, in seconds.
    pub cache_ttl_seconds: u64,
    /// Per network call timeout (connect + read), in seconds.
    pub timeout_seconds: u64,
    /// Maximum fetch attempts per calendar.
    pub max_retries: u32,
    /// Wait between failed attempts, in seconds.
    pub retry_delay_seconds: u64,
    /// Per-day event cap in the store.
    pub max_events_per_day: usize,
    /// Skip all-day entries entirely.
    pub skip_all_day: bool,
    /// Regular expressions; entries whose summary matches any are dropped.
    pub exclude_patterns: Vec<String>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_dir: PathBuf::from("cache/calendars"),
            cache_ttl_seconds: 3600,
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 2,
            max_events_per_day: 2,
            skip_all_day: false,
            exclude_patterns: Vec::new(),
        }
    }
}

impl CalendarSettings {
    /// Cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Network timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Inter-attempt delay as a [`Duration`].
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

/// File shape as written by the user. Calendar entries are kept as raw YAML
/// values so one malformed entry can be skipped without rejecting the rest.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    calendars: Vec<serde_yaml::Value>,
    #[serde(default)]
    settings: CalendarSettings,
}

/// The loaded calendar configuration: subscriptions plus tuning.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// All well-formed calendar entries, including disabled ones.
    pub calendars: Vec<CalendarSource>,
    /// Pipeline tuning.
    pub settings: CalendarSettings,
}

impl CalendarConfig {
    /// Loads the configuration from the given path.
    ///
    /// Returns `Ok(None)` when the file does not exist (the subsystem is
    /// simply not configured). Malformed calendar entries are skipped with a
    /// warning; a file that is not valid YAML at all is a configuration
    /// error.
    pub fn load(path: &Path) -> CalendarResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::configuration(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))
        })?;

        let raw: RawConfig = serde_yaml::from_str(&content).map_err(|e| {
            CalendarError::configuration(format!(
                "failed to parse {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut calendars = Vec::with_capacity(raw.calendars.len());
        for (index, value) in raw.calendars.into_iter().enumerate() {
            match serde_yaml::from_value::<CalendarSource>(value) {
                Ok(source) => calendars.push(source),
                Err(e) => {
                    warn!(index, error = %e, "Skipping malformed calendar entry");
                }
            }
        }

        Ok(Some(Self {
            calendars,
            settings: raw.settings,
        }))
    }

    /// Returns the calendars that should actually be fetched.
    pub fn enabled_sources(&self) -> Vec<&CalendarSource> {
        self.calendars.iter().filter(|c| c.enabled).collect()
    }
}
