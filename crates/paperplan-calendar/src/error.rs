//! Error types for the calendar ingestion pipeline.
//!
//! Failures in this subsystem are recovered at the lowest possible level
//! (entry, calendar, whole run); these types make the failure reason
//! inspectable at each boundary instead of collapsing everything into a
//! logged string.

use std::fmt;

use thiserror::Error;

/// The category of a calendar pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarErrorCode {
    /// The feed URL is not a valid HTTP/HTTPS URL.
    InvalidUrl,
    /// Network error - connection failed, timeout, redirect limit exceeded.
    NetworkError,
    /// The server answered with a non-2xx status.
    HttpStatus,
    /// Every fetch attempt failed.
    RetriesExhausted,
    /// Reading or writing the on-disk feed cache failed.
    CacheError,
    /// The feed or one of its values could not be parsed.
    ParseError,
    /// A recurrence rule could not be evaluated.
    RecurrenceError,
    /// The configuration resource is malformed.
    ConfigurationError,
}

impl CalendarErrorCode {
    /// Returns true if another fetch attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::HttpStatus)
    }

    /// Returns a stable snake_case name for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::NetworkError => "network_error",
            Self::HttpStatus => "http_status",
            Self::RetriesExhausted => "retries_exhausted",
            Self::CacheError => "cache_error",
            Self::ParseError => "parse_error",
            Self::RecurrenceError => "recurrence_error",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for CalendarErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from one stage of the ingestion pipeline.
#[derive(Debug, Error)]
pub struct CalendarError {
    /// The code categorizing this error.
    code: CalendarErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The calendar being processed when the error occurred, if known.
    calendar: Option<String>,
    /// The underlying cause, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CalendarError {
    /// Creates a new error with the given code and message.
    pub fn new(code: CalendarErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            calendar: None,
            source: None,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::InvalidUrl, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::NetworkError, message)
    }

    /// Creates a non-2xx response error.
    pub fn http_status(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::HttpStatus, message)
    }

    /// Creates a retries-exhausted error.
    pub fn retries_exhausted(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::RetriesExhausted, message)
    }

    /// Creates a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::CacheError, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::ParseError, message)
    }

    /// Creates a recurrence error.
    pub fn recurrence(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::RecurrenceError, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::ConfigurationError, message)
    }

    /// Sets the calendar name for this error.
    pub fn with_calendar(mut self, calendar: impl Into<String>) -> Self {
        self.calendar = Some(calendar.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> CalendarErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the calendar name, if set.
    pub fn calendar(&self) -> Option<&str> {
        self.calendar.as_deref()
    }

    /// Returns true if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref calendar) = self.calendar {
            write!(f, "[{}] ", calendar)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for pipeline operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
