//! Wall-clock source for quota decisions.

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// The scheduler compares it against the reset time reported by GitHub.
/// Tests inject a clock that follows Tokio's paused time so that quota
/// waits complete instantly and deterministically.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
