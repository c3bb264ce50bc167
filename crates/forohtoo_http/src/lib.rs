//! Registration API (spec.md §4.9/§6): the HTTP surface composing
//! `forohtoo_storage`, `forohtoo_schedule`, `forohtoo_workflow`, and
//! `forohtoo_sse` behind an `axum::Router`.

mod dto;
mod error;
mod metrics_middleware;
mod qr;
mod routes;
mod self_registration;
mod state;

pub use error::{HttpError, HttpResult};
pub use self_registration::ensure_self_registration;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

/// Body size cap per spec.md §4.9's validation rules.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS]);

    Router::new()
        .route(
            "/api/v1/wallet-assets",
            get(routes::list_wallet_assets).post(routes::create_wallet_asset),
        )
        .route(
            "/api/v1/wallet-assets/{address}",
            get(routes::get_wallet_assets_for_address).delete(routes::delete_wallet_asset),
        )
        .route("/api/v1/transactions", get(routes::list_transactions))
        .route("/api/v1/registration-status/{workflow_id}", get(routes::registration_status))
        .route("/api/v1/stream/transactions", get(routes::stream_transactions))
        .route("/api/v1/stream/transactions/{address}", get(routes::stream_transactions_for_address))
        .route("/health", get(routes::health))
        .route_layer(middleware::from_fn_with_state(state.clone(), metrics_middleware::record_http_metrics))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use forohtoo_config::PaymentGatewayConfig;
    use forohtoo_event_bus::MockEventBus;
    use forohtoo_metrics::{HttpMetrics, SseMetrics};
    use forohtoo_schedule::MockScheduleRuntime;
    use forohtoo_storage::{MockStore, RegistrationFilter};
    use forohtoo_types::Registration;
    use forohtoo_workflow::MockWorkflowRuntime;
    use tower::ServiceExt;

    use super::*;

    fn payment_gateway_disabled() -> PaymentGatewayConfig {
        PaymentGatewayConfig {
            enabled: false,
            service_wallet: None,
            service_network: None,
            fee_amount: 1,
            payment_timeout_secs: 300,
            memo_prefix: "forohtoo-reg-".into(),
        }
    }

    fn test_state(
        store: MockStore,
        schedule_runtime: MockScheduleRuntime,
        workflow_runtime: MockWorkflowRuntime,
    ) -> AppState {
        AppState {
            store: Arc::new(store),
            schedule_runtime: Arc::new(schedule_runtime),
            workflow_runtime: Arc::new(workflow_runtime),
            event_bus: Arc::new(MockEventBus::new()),
            payment_gateway: payment_gateway_disabled(),
            mainnet_usdc_mint: "mint-mainnet".into(),
            devnet_usdc_mint: "mint-devnet".into(),
            sse_metrics: SseMetrics,
            http_metrics: HttpMetrics,
        }
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let state = test_state(MockStore::new(), MockScheduleRuntime::new(), MockWorkflowRuntime::new());
        let app = router(state);

        let response = app
            .oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn create_wallet_asset_in_free_mode_returns_201() {
        let mut store = MockStore::new();
        store.expect_registration_exists().returning(|_| Ok(false));
        store.expect_upsert_registration().returning(|key, interval, status| {
            Ok(Registration {
                key: key.clone(),
                poll_interval: std::time::Duration::from_secs(interval),
                associated_token_address: None,
                last_poll_time: None,
                status,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
        });
        let mut schedule_runtime = MockScheduleRuntime::new();
        schedule_runtime.expect_create_schedule().returning(|_, _, _| Ok(()));

        let state = test_state(store, schedule_runtime, MockWorkflowRuntime::new());
        let app = router(state);

        let address = bs58::encode([3u8; 32]).into_string();
        let body = serde_json::json!({
            "address": address,
            "network": "devnet",
            "asset": { "type": "native" },
            "poll_interval": 30,
        });
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/v1/wallet-assets")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn delete_nonexistent_wallet_asset_returns_404() {
        let mut store = MockStore::new();
        store.expect_registration_exists().returning(|_| Ok(false));

        let state = test_state(store, MockScheduleRuntime::new(), MockWorkflowRuntime::new());
        let app = router(state);

        let address = bs58::encode([4u8; 32]).into_string();
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/v1/wallet-assets/{address}?network=devnet&asset_type=native"))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn registration_status_for_unknown_workflow_returns_404() {
        let mut workflow_runtime = MockWorkflowRuntime::new();
        workflow_runtime.expect_get_payment_workflow().returning(|_| Ok(None));

        let state = test_state(MockStore::new(), MockScheduleRuntime::new(), workflow_runtime);
        let app = router(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/registration-status/unknown")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_wallet_assets_returns_the_full_listing() {
        let mut store = MockStore::new();
        store.expect_list_registrations().returning(|_: RegistrationFilter| Ok(vec![]));

        let state = test_state(store, MockScheduleRuntime::new(), MockWorkflowRuntime::new());
        let app = router(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/v1/wallet-assets")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
