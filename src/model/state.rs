use std::collections::BTreeMap;

use super::*;

/// Everything the herald remembers between cycles.
///
/// Loaded whole at cycle start, mutated in memory and written back whole at cycle end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    #[serde(default)]
    predictions: BTreeMap<EventKind, PredictedOccurrence>,
    #[serde(default)]
    markers: BTreeMap<String, NaiveDate>,
}

impl NotificationState {
    /// Today's prediction for `kind`, if any. Predictions from other days are invisible.
    pub fn prediction(&self, kind: EventKind, day: NaiveDate) -> Option<&PredictedOccurrence> {
        self.predictions
            .get(&kind)
            .filter(|occurrence| occurrence.day == day)
    }

    pub fn record_prediction(&mut self, occurrence: PredictedOccurrence) {
        self.predictions.insert(occurrence.kind, occurrence);
    }

    pub fn is_sent(&self, key: &MarkerKey, day: NaiveDate) -> bool {
        self.markers.get(&key.to_string()) == Some(&day)
    }

    /// Record that `key` went out on `day`. Returns `false` if it was already recorded.
    pub fn mark_sent(&mut self, key: &MarkerKey, day: NaiveDate) -> bool {
        if self.is_sent(key, day) {
            return false;
        }

        self.markers.insert(key.to_string(), day);
        true
    }

    /// Forget everything that does not belong to `day`.
    pub fn expire(&mut self, day: NaiveDate) {
        self.predictions.retain(|_, occurrence| occurrence.day == day);
        self.markers.retain(|_, marked| *marked == day);
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty() && self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn marker_is_written_once_per_day() {
        let mut state = NotificationState::default();
        let key = MarkerKey::threshold(EventKind::Dragon, 2400);

        assert!(state.mark_sent(&key, day(1)));
        assert!(!state.mark_sent(&key, day(1)), "second write on the same day is refused");
        assert!(state.is_sent(&key, day(1)));
        assert!(!state.is_sent(&key, day(2)), "yesterday's marker must not suppress today");
    }

    #[test]
    fn stale_prediction_is_invisible_and_expires() {
        let mut state = NotificationState::default();
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        state.record_prediction(PredictedOccurrence::new(EventKind::Serpent, instant, instant, day(1)));
        state.mark_sent(&MarkerKey::once(EventKind::Lord), day(1));

        assert!(state.prediction(EventKind::Serpent, day(2)).is_none());

        state.expire(day(2));
        assert!(state.is_empty());
    }

    #[test]
    fn persisted_shape_uses_flat_marker_keys() {
        let mut state = NotificationState::default();
        state.mark_sent(&MarkerKey::threshold(EventKind::Serpent, 120), day(3));
        state.mark_sent(&MarkerKey::once(EventKind::Lord), day(3));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["markers"]["serpent_120"], "2024-05-03");
        assert_eq!(json["markers"]["lord"], "2024-05-03");

        let restored: NotificationState = serde_json::from_value(json).unwrap();
        assert_eq!(restored, state);
    }
}
