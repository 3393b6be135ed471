//! Process-wide logging setup shared by every orderdesk binary and test harness.

/// Subscriber configuration (filters, formatting).
pub mod subscriber;

pub use subscriber::{DEFAULT_FILTER, init, init_with_filter};
