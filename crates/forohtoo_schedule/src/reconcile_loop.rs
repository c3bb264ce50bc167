use std::time::Duration;

use forohtoo_metrics::ScheduleMetrics;
use forohtoo_storage::Store;
use futures::Stream;
use tracing::debug;

use crate::error::ScheduleError;
use crate::runtime::ScheduleRuntime;
use crate::schedule::{reconcile, ReconcileOutcome};

pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(60);

/// A periodic self-healing tick: yields a result every `interval`, for
/// `forohtoo_node` to drive with a `select!`/`while let` loop and log.
pub fn reconcile_stream<'a>(
    store: &'a (dyn Store + 'a),
    runtime: &'a (dyn ScheduleRuntime + 'a),
    metrics: &'a ScheduleMetrics,
    interval: Duration,
) -> impl Stream<Item = Result<ReconcileOutcome, ScheduleError>> + 'a {
    async_stream::try_stream! {
        loop {
            tokio::time::sleep(interval).await;
            debug!("running schedule reconciliation sweep");
            let outcome = reconcile(store, runtime, metrics).await?;
            yield outcome;
        }
    }
}
