use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use tracing::instrument;

pub type Timestamp = DateTime<Utc>;

pub fn now() -> Timestamp {
    Utc::now()
}

/// The fixed UTC offset the site lives in.
///
/// Every "is this today" decision goes through here so the host timezone never leaks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone(FixedOffset);

impl ReferenceZone {
    pub fn from_hours(hours: i32) -> Option<Self> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(Self)
    }

    pub fn local(&self, instant: Timestamp) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.0)
    }

    /// Calendar date of `instant` in the reference timezone.
    pub fn today(&self, instant: Timestamp) -> NaiveDate {
        self.local(instant).date_naive()
    }

    /// Interpret a wall-clock reading from the site as an instant.
    pub fn resolve(&self, local: NaiveDateTime) -> Option<Timestamp> {
        self.0
            .from_local_datetime(&local)
            .single()
            .map(|instant| instant.with_timezone(&Utc))
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self(FixedOffset::east_opt(3 * 3600).expect("+03:00 is a valid offset"))
    }
}

/// Round to the nearest whole minute, ties going up.
pub fn round_to_minute(instant: Timestamp) -> Timestamp {
    let shifted = instant + chrono::Duration::seconds(30);
    shifted
        .with_nanosecond(0)
        .and_then(|instant| instant.with_second(0))
        .unwrap_or(shifted)
}

/// Poll timer for the run loop. A slow cycle skips ticks instead of bunching them up.
#[instrument]
pub fn timer(period: Duration) -> tokio::time::Interval {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    timer
}
