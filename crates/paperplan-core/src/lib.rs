//! Core types for the paperplan calendar subsystem: day events, the
//! per-day event store, and tracing setup.

pub mod event;
pub mod store;
pub mod tracing;

pub use event::DayEvent;
pub use store::{EventStore, StoreStats};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
