//! Feed retrieval with on-disk caching and bounded retries.
//!
//! The fetcher is deliberately forgiving: any failure (bad URL, exhausted
//! retries, unreadable cache) is logged against the calendar's name and
//! surfaces as "no feed text", never as a propagated error. Feed URLs often
//! carry secrets in their query string, so log output only ever shows the
//! URL with the query stripped.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, redirect};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CalendarSettings;
use crate::error::{CalendarError, CalendarResult};

/// Maximum redirect hops followed per attempt.
const MAX_REDIRECTS: usize = 5;

/// Extension of cached feed files.
const CACHE_EXTENSION: &str = "ics";

/// Retrieves raw feed text for calendar URLs.
pub struct FeedFetcher {
    /// The underlying HTTP client (timeout and redirect policy baked in).
    client: Client,
    /// Pipeline tuning for this run.
    settings: CalendarSettings,
}

impl FeedFetcher {
    /// Creates a fetcher for one pipeline run.
    pub fn new(settings: &CalendarSettings) -> CalendarResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| CalendarError::network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// Fetches the raw feed text for one calendar.
    ///
    /// Returns `None` on any failure so one calendar can never abort the
    /// run; the reason is logged with the calendar's name. A fresh cache
    /// entry is returned without touching the network at all.
    pub async fn fetch(&self, url: &str, calendar: &str) -> Option<String> {
        let parsed = match Url::parse(url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            Ok(u) => {
                warn!(
                    calendar = %calendar,
                    url = %redacted(&u),
                    "Unsupported feed URL scheme, skipping calendar"
                );
                return None;
            }
            Err(e) => {
                warn!(calendar = %calendar, error = %e, "Invalid feed URL, skipping calendar");
                return None;
            }
        };

        if self.settings.cache_enabled
            && let Some(body) = self.cache_read(url, calendar)
        {
            return Some(body);
        }

        match self.fetch_with_retries(&parsed, calendar).await {
            Ok(body) => {
                if self.settings.cache_enabled
                    && let Err(e) = self.cache_write(url, &body)
                {
                    warn!(calendar = %calendar, error = %e, "Failed to write feed cache");
                }
                Some(body)
            }
            Err(e) => {
                warn!(calendar = %calendar, error = %e, "Giving up on calendar feed");
                None
            }
        }
    }

    /// Runs the bounded retry loop around [`Self::fetch_once`].
    async fn fetch_with_retries(&self, url: &Url, calendar: &str) -> CalendarResult<String> {
        let attempts = self.settings.max_retries.max(1);
        for attempt in 1..=attempts {
            match self.fetch_once(url).await {
                Ok(body) => {
                    info!(
                        calendar = %calendar,
                        attempt,
                        bytes = body.len(),
                        "Fetched calendar feed"
                    );
                    return Ok(body);
                }
                Err(e) => {
                    warn!(calendar = %calendar, attempt, error = %e, "Feed fetch attempt failed");
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.retry_delay()).await;
                    }
                }
            }
        }

        Err(CalendarError::retries_exhausted(format!(
            "no successful response from {} after {} attempts",
            redacted(url),
            attempts
        ))
        .with_calendar(calendar))
    }

    /// Performs a single GET, expecting a 2xx response.
    async fn fetch_once(&self, url: &Url) -> CalendarResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CalendarError::network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::http_status(format!("server returned {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| CalendarError::network(format!("failed to read body: {}", e.without_url())))
    }

    /// Cache file path for a URL: `<sha256(url)>.ics` under the cache dir.
    fn cache_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.settings
            .cache_dir
            .join(format!("{:x}.{}", digest, CACHE_EXTENSION))
    }

    /// Returns the cached body when the entry exists and its mtime age is
    /// within the TTL. A stale or unreadable entry reads as a miss.
    fn cache_read(&self, url: &str, calendar: &str) -> Option<String> {
        let path = self.cache_path(url);
        let modified = std::fs::metadata(&path).ok()?.modified().ok()?;
        // An mtime in the future means the entry was written just now.
        let age = modified.elapsed().unwrap_or(Duration::ZERO);
        if age >= self.settings.cache_ttl() {
            debug!(calendar = %calendar, age_secs = age.as_secs(), "Cached feed is stale");
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(body) => {
                info!(
                    calendar = %calendar,
                    age_secs = age.as_secs(),
                    "Using cached calendar feed"
                );
                Some(body)
            }
            Err(e) => {
                warn!(calendar = %calendar, error = %e, "Failed to read feed cache");
                None
            }
        }
    }

    /// Writes the feed body to its cache entry.
    fn cache_write(&self, url: &str, body: &str) -> CalendarResult<()> {
        std::fs::create_dir_all(&self.settings.cache_dir).map_err(|e| {
            CalendarError::cache(format!(
                "failed to create cache directory {}",
                self.settings.cache_dir.display()
            ))
            .with_source(e)
        })?;

        let path = self.cache_path(url);
        std::fs::write(&path, body).map_err(|e| {
            CalendarError::cache(format!("failed to write {}", path.display())).with_source(e)
        })?;
        debug!(path = %path.display(), bytes = body.len(), "Cached calendar feed");
        Ok(())
    }
}

/// Returns the URL with query string and fragment stripped, for log output.
fn redacted(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.set_fragment(None);
    clean.to_string()
}
