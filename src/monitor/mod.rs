use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::time::Instant;

use crate::service::site::PageSource;
use crate::service::telegram::Dispatcher;
use crate::time;

pub use cycle::*;

mod cycle;

/// Run cycles every `period` until `run_for` has elapsed or the process is interrupted.
///
/// The deadline is only checked between cycles; a cycle that has started always finishes.
/// A cycle that fails or panics is logged and the loop carries on.
pub async fn watch<S, D>(monitor: Arc<Monitor<S, D>>, period: Duration, run_for: Option<Duration>)
where
    S: PageSource + 'static,
    D: Dispatcher + 'static,
{
    let started = Instant::now();
    let mut timer = time::timer(period);
    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

    tracing::info!(?period, ?run_for, "herald is watching");

    loop {
        select! {
            _ = timer.tick() => {}
            _ = &mut shutdown => {
                tracing::info!("interrupted, stopping");
                break;
            }
        }

        let cycle = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.run_cycle(time::now()).await }
        });

        match cycle.await {
            Ok(Ok(report)) => tracing::info!(
                pages = report.pages,
                failed = ?report.failed_pages,
                detected = report.detected,
                notified = report.notified,
                "cycle finished"
            ),
            Ok(Err(error)) => tracing::error!(%error, "cycle failed"),
            Err(error) => tracing::error!(%error, "cycle aborted"),
        }

        if run_for.is_some_and(|limit| started.elapsed() >= limit) {
            tracing::info!("run time is up, stopping");
            break;
        }
    }
}
