use super::*;

/// When an event is going to happen, as the page told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timing {
    /// "in N seconds", measured at `observed_at`.
    Countdown { seconds: u32, observed_at: Timestamp },
    /// A wall-clock instant, optionally with the place it happens at.
    Absolute {
        at: Timestamp,
        location: Option<String>,
    },
}

/// A timing fact pulled out of a single page fetch. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct DetectedEvent {
    pub kind: EventKind,
    pub timing: Timing,
}

impl DetectedEvent {
    pub fn countdown(kind: EventKind, seconds: u32, observed_at: Timestamp) -> Self {
        Self::new(kind, Timing::Countdown { seconds, observed_at })
    }

    pub fn absolute(kind: EventKind, at: Timestamp, location: Option<String>) -> Self {
        Self::new(kind, Timing::Absolute { at, location })
    }
}
