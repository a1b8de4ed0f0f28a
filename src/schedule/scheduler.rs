use super::*;

/// What to do with thresholds the countdown jumped over between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedThresholds {
    /// Only the smallest threshold at or above the time left fires; jumped-over ones are lost.
    #[default]
    Skip,
    /// Fold every threshold crossed since the prediction was made into the notification.
    Fire,
}

/// A notification that should go out now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Due {
    pub kind: EventKind,
    pub seconds_left: i64,
    pub predicted_at: Timestamp,
    pub location: Option<String>,
    /// Markers to write once the notification has been handed to the dispatcher.
    pub markers: Vec<MarkerKey>,
    pub day: NaiveDate,
}

/// Picks at most one notification per occurrence and cycle, never one that was already sent.
#[derive(Debug, Clone)]
pub struct Scheduler {
    /// Lead times in seconds, ascending and unique.
    thresholds: Vec<u64>,
    skipped: SkippedThresholds,
    zone: ReferenceZone,
}

impl Scheduler {
    pub fn new(
        thresholds: impl IntoIterator<Item = u64>, skipped: SkippedThresholds, zone: ReferenceZone,
    ) -> Self {
        let mut thresholds: Vec<u64> = thresholds.into_iter().collect();
        thresholds.sort_unstable();
        thresholds.dedup();

        Self {
            thresholds,
            skipped,
            zone,
        }
    }

    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    /// Notification due for a countdown occurrence, if any.
    pub fn countdown(
        &self, occurrence: &PredictedOccurrence, now: Timestamp, state: &NotificationState,
    ) -> Option<Due> {
        let kind = occurrence.kind;
        let day = self.zone.today(now);
        let seconds_left = (occurrence.predicted_at - now).num_seconds();
        let left = u64::try_from(seconds_left).ok().filter(|&left| left > 0)?;

        let current = self.thresholds.iter().copied().find(|&threshold| threshold >= left)?;

        let mut pending = vec![current];
        if self.skipped == SkippedThresholds::Fire {
            let lead = u64::try_from(occurrence.initial_lead().num_seconds()).unwrap_or(0);
            pending.extend(
                self.thresholds
                    .iter()
                    .copied()
                    .filter(|&threshold| threshold > current && threshold < lead),
            );
        }

        let markers: Vec<MarkerKey> = pending
            .into_iter()
            .map(|threshold| MarkerKey::threshold(kind, threshold))
            .filter(|key| !state.is_sent(key, day))
            .collect();

        if markers.is_empty() {
            tracing::trace!(%kind, threshold = current, seconds_left, "already notified");
            return None;
        }

        Some(Due {
            kind,
            seconds_left,
            predicted_at: occurrence.predicted_at,
            location: None,
            markers,
            day,
        })
    }

    /// Notification due for an absolute occurrence: once per day, and only before it happens.
    pub fn absolute(
        &self, kind: EventKind, at: Timestamp, location: Option<String>, now: Timestamp,
        state: &NotificationState,
    ) -> Option<Due> {
        let day = self.zone.today(now);
        let seconds_left = (at - now).num_seconds();
        if seconds_left <= 0 {
            tracing::trace!(%kind, %at, "occurrence already passed");
            return None;
        }

        let key = MarkerKey::once(kind);
        if state.is_sent(&key, day) {
            return None;
        }

        Some(Due {
            kind,
            seconds_left,
            predicted_at: at,
            location,
            markers: vec![key],
            day,
        })
    }
}
