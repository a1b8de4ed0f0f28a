use super::*;

/// Today's belief about when `kind` is going to happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct PredictedOccurrence {
    pub kind: EventKind,
    /// Rounded to the minute so the human-facing ETA stays stable between polls.
    pub predicted_at: Timestamp,
    /// When the countdown behind this prediction was read.
    pub observed_at: Timestamp,
    /// Reference-timezone date the prediction belongs to.
    pub day: NaiveDate,
}

impl PredictedOccurrence {
    /// Lead time the prediction had when it was made.
    pub fn initial_lead(&self) -> chrono::Duration {
        self.predicted_at - self.observed_at
    }
}
