use snafu::{ResultExt as _, Snafu};
use tracing::instrument;

use crate::compose::Composer;
use crate::extract::{Page, Strategy};
use crate::model::{DetectedEvent, NotificationState, Timing};
use crate::schedule::{Due, Reconciler, Scheduler};
use crate::service::site::PageSource;
use crate::service::state::{StateError, StateStore};
use crate::service::telegram::Dispatcher;
use crate::time::{ReferenceZone, Timestamp};

#[derive(Debug, Snafu)]
pub enum CycleError {
    #[snafu(display("could not persist notification state: {source}"))]
    Persist { source: StateError },
}

/// What one cycle did, for the run loop's log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub pages: usize,
    pub failed_pages: Vec<Page>,
    pub detected: usize,
    pub notified: usize,
}

/// One poll cycle: fetch, extract, reconcile, schedule, dispatch, persist.
pub struct Monitor<S, D> {
    pub source: S,
    pub dispatcher: D,
    pub store: StateStore,
    pub strategies: Vec<Box<dyn Strategy>>,
    pub reconciler: Reconciler,
    pub scheduler: Scheduler,
    pub composer: Composer,
    pub zone: ReferenceZone,
    pub recipients: Vec<String>,
    pub silent: bool,
}

impl<S, D> Monitor<S, D>
where
    S: PageSource,
    D: Dispatcher,
{
    /// Run one full cycle at `now`.
    ///
    /// A page that cannot be fetched only costs the events of that page. The state is read
    /// once at the start and written once at the end.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self, now: Timestamp) -> Result<CycleReport, CycleError> {
        let mut report = CycleReport::default();
        let mut state = self.store.load();
        state.expire(self.zone.today(now));

        for strategy in &self.strategies {
            let page = strategy.page();
            report.pages += 1;

            let html = match self.source.fetch(page).await {
                Ok(html) => html,
                Err(error) => {
                    tracing::error!(%page, %error, "could not fetch page");
                    report.failed_pages.push(page);
                    continue;
                }
            };

            let extraction = strategy.extract(&html, now);
            if extraction.is_empty() {
                tracing::debug!(%page, "nothing on the page");
            }

            for event in extraction {
                report.detected += 1;
                if let Some(due) = self.plan(event, now, &mut state) {
                    self.notify(due, now, &mut state).await;
                    report.notified += 1;
                }
            }
        }

        self.store.save(&state).context(PersistSnafu)?;
        Ok(report)
    }

    fn plan(&self, event: DetectedEvent, now: Timestamp, state: &mut NotificationState) -> Option<Due> {
        let kind = event.kind;

        match event.timing {
            Timing::Countdown {
                seconds,
                observed_at,
            } => {
                let day = self.zone.today(observed_at);
                let prior = state.prediction(kind, day);
                let occurrence = self.reconciler.reconcile(kind, seconds, observed_at, prior);
                state.record_prediction(occurrence.clone());

                self.scheduler.countdown(&occurrence, now, state)
            }
            Timing::Absolute { at, location } => {
                self.scheduler.absolute(kind, at, location, now, state)
            }
        }
    }

    /// Hand the notification to the dispatcher and mark it sent, whatever the delivery outcome.
    async fn notify(&self, due: Due, now: Timestamp, state: &mut NotificationState) {
        let text = self.composer.compose(
            due.kind,
            due.seconds_left,
            due.predicted_at,
            now,
            due.location.as_deref(),
        );
        tracing::info!(kind = %due.kind, seconds_left = due.seconds_left, %text, "sending notification");

        let deliveries = self.dispatcher.send(&self.recipients, &text, self.silent).await;
        for delivery in deliveries.iter().filter(|delivery| !delivery.is_delivered()) {
            if let Err(error) = &delivery.outcome {
                tracing::warn!(kind = %due.kind, recipient = %delivery.recipient, %error, "notification not delivered");
            }
        }

        for key in &due.markers {
            state.mark_sent(key, due.day);
        }
    }
}
