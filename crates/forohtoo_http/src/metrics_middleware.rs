use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

use crate::state::AppState;

/// Records `HttpMetrics` for every request via a `tower` middleware, rather
/// than having each route call a recorder by hand.
pub async fn record_http_metrics(
    State(state): State<AppState>,
    matched_path: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Response {
    let route = matched_path.as_ref().map(|p| p.as_str()).unwrap_or("unmatched");
    let route = known_route(route);
    let started = Instant::now();
    let response = next.run(request).await;
    state.http_metrics.record_request(route, response.status().as_u16(), started.elapsed().as_secs_f64());
    response
}

/// Maps a matched route pattern to one of this crate's fixed route labels,
/// avoiding a per-request heap allocation for the `&'static str`
/// `HttpMetrics::record_request` expects.
fn known_route(path: &str) -> &'static str {
    match path {
        "/api/v1/wallet-assets" => "/api/v1/wallet-assets",
        "/api/v1/wallet-assets/{address}" => "/api/v1/wallet-assets/{address}",
        "/api/v1/transactions" => "/api/v1/transactions",
        "/api/v1/registration-status/{workflow_id}" => "/api/v1/registration-status/{workflow_id}",
        "/api/v1/stream/transactions" => "/api/v1/stream/transactions",
        "/api/v1/stream/transactions/{address}" => "/api/v1/stream/transactions/{address}",
        "/health" => "/health",
        _ => "unmatched",
    }
}
