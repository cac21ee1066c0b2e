//! # Activity windows
//! Buckets message age into three fixed recency windows.
//!
//! Buckets are exclusive and checked in order: a message counts as `recent`,
//! else `short_term`, else `mid_term`. Anything older than the widest window
//! is not counted at all.

use chrono::{DateTime, Duration, Utc};

use crate::ingest::types::{ActivityCounts, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Min10,
    Hour1,
    Hour3,
}

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Min10 => "10m",
            Window::Hour1 => "1h",
            Window::Hour3 => "3h",
        }
    }

    pub fn span(&self) -> Duration {
        match self {
            Window::Min10 => Duration::minutes(10),
            Window::Hour1 => Duration::hours(1),
            Window::Hour3 => Duration::hours(3),
        }
    }

    /// Narrowest first; classification depends on this order.
    pub fn all() -> [Window; 3] {
        [Window::Min10, Window::Hour1, Window::Hour3]
    }

    /// The narrowest window containing `elapsed`, or `None` past three hours.
    /// Negative ages (posts stamped slightly in the future) fall into the first window.
    pub fn for_elapsed(elapsed: Duration) -> Option<Window> {
        Window::all().into_iter().find(|w| elapsed <= w.span())
    }
}

/// Count `batch` per window relative to a single `now`.
pub fn classify(now: DateTime<Utc>, batch: &[Message]) -> ActivityCounts {
    let mut counts = ActivityCounts::default();
    for msg in batch {
        match Window::for_elapsed(now - msg.created_at) {
            Some(Window::Min10) => counts.recent += 1,
            Some(Window::Hour1) => counts.short_term += 1,
            Some(Window::Hour3) => counts.mid_term += 1,
            None => {}
        }
    }
    counts
}
