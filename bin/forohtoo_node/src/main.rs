//! Node entry point: loads configuration, wires every component behind its
//! trait boundary, and runs the HTTP server and schedule reconciliation sweep
//! concurrently until one of them exits.

use std::sync::Arc;
use std::time::Duration;

use forohtoo_config::ForohtooConfig;
use forohtoo_event_bus::NatsEventBus;
use forohtoo_http::AppState;
use forohtoo_metrics::{HttpMetrics, ScheduleMetrics, SseMetrics};
use forohtoo_poller::PollerActivity;
use forohtoo_rpc_oracle::HttpRpcOracle;
use forohtoo_schedule::{InProcessScheduleRuntime, ScheduleHandler};
use forohtoo_storage::PgStore;
use forohtoo_types::RegistrationKey;
use forohtoo_workflow::InProcessWorkflowRuntime;
use tracing::{error, info, warn};

const RPC_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs a [`PollerActivity`] for whatever schedule tick invokes it. The only
/// `ScheduleHandler` this node ever builds; kept here rather than in
/// `forohtoo_schedule` so that crate stays ignorant of oracles and stores.
struct PollCycleHandler {
    activity: PollerActivity<PgStore, HttpRpcOracle, NatsEventBus>,
}

#[async_trait::async_trait]
impl ScheduleHandler for PollCycleHandler {
    async fn run_cycle(&self, key: &RegistrationKey) {
        if let Err(e) = self.activity.run_poll_cycle(key).await {
            warn!(address = %key.address, network = %key.network, error = %e, "poll cycle failed");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ForohtooConfig::load()?;
    forohtoo_config::init_tracing(&config.log_level);
    let prometheus_handle = forohtoo_metrics::install_prometheus_exporter();

    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    store.migrate().await?;
    info!("database connected and migrated");

    let event_bus = Arc::new(NatsEventBus::connect(&config.message_bus_url).await?);
    info!("message bus connected");

    let oracle = Arc::new(HttpRpcOracle::new(
        config.mainnet_rpc_urls.clone(),
        config.devnet_rpc_urls.clone(),
        RPC_REQUEST_TIMEOUT,
    ));

    let poll_handler = Arc::new(PollCycleHandler {
        activity: PollerActivity::new(store.clone(), oracle, event_bus.clone()),
    });
    let schedule_runtime = Arc::new(InProcessScheduleRuntime::new(poll_handler));
    let workflow_runtime =
        Arc::new(InProcessWorkflowRuntime::new(store.clone(), store.clone(), event_bus.clone(), schedule_runtime.clone()));

    forohtoo_http::ensure_self_registration(&config, store.as_ref(), schedule_runtime.as_ref()).await?;

    let app_state = AppState {
        store: store.clone(),
        schedule_runtime: schedule_runtime.clone(),
        workflow_runtime,
        event_bus,
        payment_gateway: config.payment_gateway.clone(),
        mainnet_usdc_mint: config.mainnet_usdc_mint.clone(),
        devnet_usdc_mint: config.devnet_usdc_mint.clone(),
        sse_metrics: SseMetrics,
        http_metrics: HttpMetrics,
    };
    let app = forohtoo_http::router(app_state)
        .route("/metrics", axum::routing::get(move || async move { prometheus_handle.render() }));

    let listener = tokio::net::TcpListener::bind(&config.http_bind_addr).await?;
    info!(addr = %config.http_bind_addr, "http server listening");

    let reconcile_interval = forohtoo_schedule::DEFAULT_RECONCILE_INTERVAL;
    let reconcile_store = store;
    let reconcile_runtime = schedule_runtime;
    let reconcile_task = async move {
        use futures::StreamExt;
        let metrics = ScheduleMetrics;
        let stream =
            forohtoo_schedule::reconcile_stream(reconcile_store.as_ref(), reconcile_runtime.as_ref(), &metrics, reconcile_interval);
        tokio::pin!(stream);
        while let Some(outcome) = stream.next().await {
            match outcome {
                Ok(outcome) => info!(created = outcome.created, deleted = outcome.deleted, "schedule reconciled"),
                Err(e) => error!(error = %e, "schedule reconciliation sweep failed"),
            }
        }
    };

    tokio::select! {
        result = axum::serve(listener, app) => result.map_err(anyhow::Error::from),
        _ = reconcile_task => Ok(()),
    }
}
