use std::sync::Arc;

use forohtoo_config::PaymentGatewayConfig;
use forohtoo_event_bus::EventBus;
use forohtoo_metrics::{HttpMetrics, SseMetrics};
use forohtoo_schedule::ScheduleRuntime;
use forohtoo_storage::Store;
use forohtoo_workflow::WorkflowRuntime;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub schedule_runtime: Arc<dyn ScheduleRuntime>,
    pub workflow_runtime: Arc<dyn WorkflowRuntime>,
    pub event_bus: Arc<dyn EventBus>,
    pub payment_gateway: PaymentGatewayConfig,
    pub mainnet_usdc_mint: String,
    pub devnet_usdc_mint: String,
    pub sse_metrics: SseMetrics,
    pub http_metrics: HttpMetrics,
}
