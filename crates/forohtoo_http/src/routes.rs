use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use forohtoo_storage::RegistrationFilter;
use forohtoo_types::{Registration, RegistrationKey, RegistrationStatus};
use forohtoo_workflow::PaymentWorkflowInput;
use futures::Stream;
use hyper::StatusCode;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::dto::{
    CreateWalletAssetRequest, DeleteWalletAssetQuery, ListTransactionsQuery, RegistrationStatusResponse,
    StreamQuery, WalletAssetsByAddressQuery,
};
use crate::error::{HttpError, HttpResult};
use crate::qr;
use crate::state::AppState;

pub async fn health() -> &'static str {
    "OK"
}

pub async fn create_wallet_asset(
    State(state): State<AppState>,
    Json(body): Json<CreateWalletAssetRequest>,
) -> HttpResult<Response> {
    body.validate()?;
    let key = RegistrationKey::new(
        body.address.clone(),
        body.network,
        body.asset.asset_type,
        body.asset.token_mint.clone(),
    )?;
    let interval = Registration::clamp_poll_interval(Duration::from_secs(body.poll_interval));

    if state.store.registration_exists(&key).await? {
        let registration =
            state.store.upsert_registration(&key, interval.as_secs(), RegistrationStatus::Active).await?;
        forohtoo_schedule::upsert(state.schedule_runtime.as_ref(), key, interval).await?;
        return Ok((StatusCode::OK, Json(registration)).into_response());
    }

    if !state.payment_gateway.enabled {
        let registration =
            state.store.upsert_registration(&key, interval.as_secs(), RegistrationStatus::Active).await?;
        forohtoo_schedule::upsert(state.schedule_runtime.as_ref(), key, interval).await?;
        return Ok((StatusCode::CREATED, Json(registration)).into_response());
    }

    let service_wallet = state
        .payment_gateway
        .service_wallet
        .clone()
        .ok_or_else(|| HttpError::Configuration("payment gateway enabled without service_wallet".into()))?;
    let service_network = state
        .payment_gateway
        .service_network
        .ok_or_else(|| HttpError::Configuration("payment gateway enabled without service_network".into()))?;
    let usdc_mint = match key.network {
        forohtoo_types::Network::Mainnet => state.mainnet_usdc_mint.clone(),
        forohtoo_types::Network::Devnet => state.devnet_usdc_mint.clone(),
    };

    let input = PaymentWorkflowInput {
        target: key,
        poll_interval: interval,
        service_wallet,
        service_network,
        usdc_mint,
        fee_amount: state.payment_gateway.fee_amount,
        payment_timeout: Duration::from_secs(state.payment_gateway.payment_timeout_secs),
        memo_prefix: state.payment_gateway.memo_prefix.clone(),
        status_url_base: "/api/v1/registration-status".into(),
    };
    let workflow = state.workflow_runtime.start_payment_workflow(input).await?;

    let mut invoice = workflow.invoice.clone();
    invoice.qr_code_data = qr::render_qr_png_base64(&invoice.payment_url);

    Ok((
        StatusCode::PAYMENT_REQUIRED,
        Json(json!({
            "status": "payment_required",
            "workflow_id": workflow.workflow_id,
            "status_url": invoice.status_url,
            "invoice": invoice,
        })),
    )
        .into_response())
}

pub async fn list_wallet_assets(State(state): State<AppState>) -> HttpResult<Json<Vec<Registration>>> {
    let registrations = state.store.list_registrations(RegistrationFilter::default()).await?;
    Ok(Json(registrations))
}

pub async fn get_wallet_assets_for_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<WalletAssetsByAddressQuery>,
) -> HttpResult<Json<Vec<Registration>>> {
    let registrations = state.store.list_registrations_by_address(&address, query.network).await?;
    Ok(Json(registrations))
}

pub async fn delete_wallet_asset(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<DeleteWalletAssetQuery>,
) -> HttpResult<StatusCode> {
    let key = RegistrationKey::new(address, query.network, query.asset_type, query.token_mint)?;
    if !state.store.registration_exists(&key).await? {
        return Err(HttpError::NotFound(key.to_string()));
    }
    // Delete the schedule before the row: polling stops even if the row
    // somehow survives the second step (spec.md §4.9).
    forohtoo_schedule::delete(state.schedule_runtime.as_ref(), &key).await?;
    state.store.delete_registration(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> HttpResult<Json<Vec<forohtoo_types::Transaction>>> {
    query.validate()?;
    let limit = query.limit.unwrap_or(100);
    let offset = query.offset.unwrap_or(0);
    let transactions = state
        .store
        .list_transactions_by_wallet(&query.wallet_address, query.network, limit, offset)
        .await?;
    Ok(Json(transactions))
}

pub async fn registration_status(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> HttpResult<Json<RegistrationStatusResponse>> {
    let workflow = state
        .workflow_runtime
        .get_payment_workflow(&workflow_id)
        .await?
        .ok_or_else(|| HttpError::NotFound(workflow_id.clone()))?;
    Ok(Json(RegistrationStatusResponse {
        status: workflow.status,
        payment_signature: workflow.payment_signature,
        error: workflow.error_message,
    }))
}

pub async fn stream_transactions(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    stream_response(state, None, query)
}

pub async fn stream_transactions_for_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    stream_response(state, Some(address), query)
}

fn stream_response(
    state: AppState,
    address: Option<String>,
    query: StreamQuery,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(wallet = ?address, "opening SSE connection");
    let lookback = query.lookback.map(Duration::from_secs);
    let stream =
        forohtoo_sse::transaction_events(state.store, state.event_bus, address, lookback, state.sse_metrics);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(10)).text("keepalive"))
}
