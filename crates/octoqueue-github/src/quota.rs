//! Rate-limit window tracking.
//!
//! GitHub reports the state of the caller's quota on every response:
//! - `x-ratelimit-limit`: requests allowed in the window
//! - `x-ratelimit-remaining`: requests left in the window
//! - `x-ratelimit-reset`: Unix timestamp when the window resets
//! - `x-ratelimit-used`: requests already made in the window
//! - `x-ratelimit-resource`: the resource class (`core`, `search`, ...)
//!
//! The server is authoritative, so a complete set of headers always replaces
//! whatever the client believed before.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::HeaderMap;
use serde::Serialize;

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET: &str = "x-ratelimit-reset";
const HEADER_USED: &str = "x-ratelimit-used";
const HEADER_RESOURCE: &str = "x-ratelimit-resource";

/// Primary limit for authenticated REST calls.
const DEFAULT_LIMIT: u64 = 5000;

/// Resource class assumed when the server does not name one.
pub const DEFAULT_RESOURCE: &str = "core";

/// The current rate-limit window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaState {
    /// Maximum requests allowed in the window.
    pub limit: u64,

    /// Requests remaining in the window.
    pub remaining: u64,

    /// When the window resets (absolute).
    pub reset_at: DateTime<Utc>,

    /// Requests already made in the window.
    pub used: u64,

    /// Resource class the window applies to.
    pub resource: String,
}

impl QuotaState {
    /// Create a window from explicit values.
    #[must_use]
    pub fn new(
        limit: u64,
        remaining: u64,
        reset_at: DateTime<Utc>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
            used: limit.saturating_sub(remaining),
            resource: resource.into(),
        }
    }

    /// Whether a request may be sent right now.
    #[must_use]
    pub const fn can_dispatch_now(&self) -> bool {
        self.remaining > 0
    }

    /// Time left until the window resets, zero if it already has.
    #[must_use]
    pub fn time_until_reset(&self, now: DateTime<Utc>) -> Duration {
        (self.reset_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Overwrite the window from response headers.
    ///
    /// Requires limit, remaining, reset and used to be present and numeric;
    /// otherwise nothing changes. Returns whether the state was updated.
    pub fn apply_headers(&mut self, headers: &HeaderMap) -> bool {
        let (Some(limit), Some(remaining), Some(reset), Some(used)) = (
            header_u64(headers, HEADER_LIMIT),
            header_u64(headers, HEADER_REMAINING),
            header_u64(headers, HEADER_RESET),
            header_u64(headers, HEADER_USED),
        ) else {
            return false;
        };
        let Some(reset_at) = i64::try_from(reset)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        else {
            return false;
        };

        let resource = headers
            .get(HEADER_RESOURCE)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| DEFAULT_RESOURCE.to_string(), str::to_string);

        *self = Self {
            limit,
            remaining,
            reset_at,
            used,
            resource,
        };
        true
    }

    /// Assume a fresh window once the reset time (plus `margin`) has passed.
    ///
    /// Only applies to an exhausted window. The next response replaces the
    /// assumed values with the server's. Returns whether a rollover happened.
    pub fn roll_over(&mut self, now: DateTime<Utc>, margin: Duration) -> bool {
        if self.remaining > 0 {
            return false;
        }
        let margin = TimeDelta::from_std(margin).unwrap_or(TimeDelta::MAX);
        let Some(open_at) = self.reset_at.checked_add_signed(margin) else {
            return false;
        };
        if now < open_at {
            return false;
        }

        self.remaining = self.limit.max(1);
        self.used = 0;
        true
    }

    /// Mark the window exhausted after a rate-limit rejection, so nothing is
    /// sent again until `retry_after` from `now` has elapsed.
    ///
    /// A delay past the representable range pins the reset to the latest
    /// representable time.
    pub fn exhaust(&mut self, now: DateTime<Utc>, retry_after: Duration) {
        let delta = TimeDelta::from_std(retry_after).unwrap_or(TimeDelta::MAX);
        self.remaining = 0;
        self.used = self.limit;
        self.reset_at = now
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Default for QuotaState {
    /// Optimistic window used before the first response arrives.
    fn default() -> Self {
        Self::new(
            DEFAULT_LIMIT,
            DEFAULT_LIMIT,
            DateTime::<Utc>::UNIX_EPOCH,
            DEFAULT_RESOURCE,
        )
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
