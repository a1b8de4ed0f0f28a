use crate::time::round_to_minute;

use super::*;

pub const DRIFT_TOLERANCE_SECS: i64 = 120;

/// Folds repeated countdown readings into one stable prediction per kind and day.
#[derive(Debug, Clone, Copy, new)]
pub struct Reconciler {
    zone: ReferenceZone,
    tolerance: chrono::Duration,
}

impl Reconciler {
    /// Prediction to hold after reading `seconds` left on the countdown for `kind` at `now`.
    ///
    /// A prior prediction from today survives unless the new reading disagrees with it by at
    /// least the drift tolerance, in which case the new reading replaces it outright.
    pub fn reconcile(
        &self, kind: EventKind, seconds: u32, now: Timestamp, prior: Option<&PredictedOccurrence>,
    ) -> PredictedOccurrence {
        let day = self.zone.today(now);
        let observed = now + chrono::Duration::seconds(i64::from(seconds));
        let proposed = PredictedOccurrence::new(kind, round_to_minute(observed), now, day);

        let Some(prior) = prior.filter(|prior| prior.kind == kind && prior.day == day) else {
            tracing::info!(%kind, predicted_at = %proposed.predicted_at, "new prediction");
            return proposed;
        };

        let drift = (observed - prior.predicted_at).num_seconds().abs();
        if drift < self.tolerance.num_seconds() {
            tracing::trace!(%kind, drift, "reading agrees with prediction");
            return prior.clone();
        }

        tracing::info!(
            %kind,
            previous = %prior.predicted_at,
            predicted_at = %proposed.predicted_at,
            drift,
            "prediction drifted, replacing it"
        );
        proposed
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(ReferenceZone::default(), chrono::Duration::seconds(DRIFT_TOLERANCE_SECS))
    }
}
