//! Named metrics, grouped by component: a const name per measurement and a
//! thin struct exposing only the increments/records that component needs.
//! Built on the plain `metrics` facade.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const POLL_CYCLES_STARTED: &str = "forohtoo_poll_cycles_started";
pub const POLL_CYCLES_SUCCEEDED: &str = "forohtoo_poll_cycles_succeeded";
pub const POLL_CYCLES_FAILED: &str = "forohtoo_poll_cycles_failed";
pub const POLL_TRANSACTIONS_DETECTED: &str = "forohtoo_poll_transactions_detected";
pub const POLL_CYCLE_DURATION_SECONDS: &str = "forohtoo_poll_cycle_duration_seconds";

pub const SCHEDULE_RECONCILE_RUNS: &str = "forohtoo_schedule_reconcile_runs";
pub const SCHEDULE_RECONCILE_CREATED: &str = "forohtoo_schedule_reconcile_created";
pub const SCHEDULE_RECONCILE_DELETED: &str = "forohtoo_schedule_reconcile_deleted";

pub const EVENT_BUS_PUBLISHED: &str = "forohtoo_event_bus_published";
pub const EVENT_BUS_PUBLISH_FAILURES: &str = "forohtoo_event_bus_publish_failures";

pub const SSE_ACTIVE_CONNECTIONS: &str = "forohtoo_sse_active_connections";
pub const SSE_EVENTS_FORWARDED: &str = "forohtoo_sse_events_forwarded";

pub const PAYMENT_WORKFLOWS_STARTED: &str = "forohtoo_payment_workflows_started";
pub const PAYMENT_WORKFLOWS_COMPLETED: &str = "forohtoo_payment_workflows_completed";
pub const PAYMENT_WORKFLOWS_FAILED: &str = "forohtoo_payment_workflows_failed";
pub const PAYMENT_WORKFLOWS_EXPIRED: &str = "forohtoo_payment_workflows_expired";

pub const HTTP_REQUESTS_TOTAL: &str = "forohtoo_http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "forohtoo_http_request_duration_seconds";

/// Installs the process-wide Prometheus recorder and returns the handle used
/// to render `/metrics`. Must be called exactly once, before any other
/// metrics macro invocation.
pub fn install_prometheus_exporter() -> PrometheusHandle {
    PrometheusBuilder::new().install_recorder().expect("failed to install prometheus recorder")
}

#[derive(Clone, Copy, Default)]
pub struct PollerMetrics;

impl PollerMetrics {
    pub fn record_cycle_started(&self) {
        metrics::counter!(POLL_CYCLES_STARTED).increment(1);
    }

    pub fn record_cycle_outcome(&self, succeeded: bool, duration_secs: f64, transactions_detected: u64) {
        let name = if succeeded { POLL_CYCLES_SUCCEEDED } else { POLL_CYCLES_FAILED };
        metrics::counter!(name).increment(1);
        metrics::histogram!(POLL_CYCLE_DURATION_SECONDS).record(duration_secs);
        if transactions_detected > 0 {
            metrics::counter!(POLL_TRANSACTIONS_DETECTED).increment(transactions_detected);
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct ScheduleMetrics;

impl ScheduleMetrics {
    pub fn record_reconcile_run(&self, created: u64, deleted: u64) {
        metrics::counter!(SCHEDULE_RECONCILE_RUNS).increment(1);
        metrics::counter!(SCHEDULE_RECONCILE_CREATED).increment(created);
        metrics::counter!(SCHEDULE_RECONCILE_DELETED).increment(deleted);
    }
}

#[derive(Clone, Copy, Default)]
pub struct EventBusMetrics;

impl EventBusMetrics {
    pub fn record_publish(&self, succeeded: bool) {
        if succeeded {
            metrics::counter!(EVENT_BUS_PUBLISHED).increment(1);
        } else {
            metrics::counter!(EVENT_BUS_PUBLISH_FAILURES).increment(1);
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct SseMetrics;

impl SseMetrics {
    pub fn connection_opened(&self) {
        metrics::gauge!(SSE_ACTIVE_CONNECTIONS).increment(1.0);
    }

    pub fn connection_closed(&self) {
        metrics::gauge!(SSE_ACTIVE_CONNECTIONS).decrement(1.0);
    }

    pub fn event_forwarded(&self) {
        metrics::counter!(SSE_EVENTS_FORWARDED).increment(1);
    }
}

#[derive(Clone, Copy, Default)]
pub struct PaymentWorkflowMetrics;

impl PaymentWorkflowMetrics {
    pub fn record_started(&self) {
        metrics::counter!(PAYMENT_WORKFLOWS_STARTED).increment(1);
    }

    pub fn record_completed(&self) {
        metrics::counter!(PAYMENT_WORKFLOWS_COMPLETED).increment(1);
    }

    pub fn record_failed(&self) {
        metrics::counter!(PAYMENT_WORKFLOWS_FAILED).increment(1);
    }

    pub fn record_expired(&self) {
        metrics::counter!(PAYMENT_WORKFLOWS_EXPIRED).increment(1);
    }
}

#[derive(Clone, Copy, Default)]
pub struct HttpMetrics;

impl HttpMetrics {
    pub fn record_request(&self, route: &'static str, status: u16, duration_secs: f64) {
        metrics::counter!(HTTP_REQUESTS_TOTAL, "route" => route, "status" => status.to_string())
            .increment(1);
        metrics::histogram!(HTTP_REQUEST_DURATION_SECONDS, "route" => route).record(duration_secs);
    }
}
