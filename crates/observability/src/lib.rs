//! `gatehouse-observability` — process-wide tracing setup.
//!
//! The library crates only emit `tracing` events; a host binary (or a test)
//! calls [`init`] once to install a subscriber.

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, init_with};
