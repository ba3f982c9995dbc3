//! Request middleware: authentication, rate limiting and request logging.

use super::error::ApiError;
use super::state::AppState;
use crate::observability::{RequestContext, scope_request_context};
use crate::security::RateLimitDecision;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Instant;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Client key used when no address is known.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Identifies the client for rate limiting and logs: the first
/// `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
#[must_use]
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header_value("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .or_else(|| header_value("x-real-ip"))
        .map(ToString::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

fn peer_addr(req: &Request) -> Option<SocketAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Rejects requests without a valid bearer token and attaches the
/// validated [`Claims`](crate::security::Claims) to the request.
pub async fn require_jwt(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            metrics::counter!("atlas_auth_failures_total", "reason" => "missing").increment(1);
            ApiError::unauthorized()
        })?;

    let claims = state.tokens.validate_header(header).map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        metrics::counter!("atlas_auth_failures_total", "reason" => "invalid").increment(1);
        ApiError::unauthorized()
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Applies the fixed-window rate limit per client.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(req.headers(), peer_addr(&req));

    match state.limiter.check(&client) {
        RateLimitDecision::Allowed { .. } => next.run(req).await,
        RateLimitDecision::Limited { retry_after } => {
            tracing::warn!(client = %client, "Rate limit exceeded");
            metrics::counter!("atlas_rate_limit_exceeded_total").increment(1);

            let mut response =
                ApiError::new(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        },
    }
}

/// Scopes a [`RequestContext`] around the request, echoes its id in
/// `x-request-id`, and logs and measures the outcome.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let incoming_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);

    let context = RequestContext::from_incoming(
        incoming_id.as_deref(),
        client_key(req.headers(), peer_addr(&req)),
    );
    let request_id = context.request_id().to_string();
    let client = context.client().to_string();

    let mut response = scope_request_context(context, next.run(req)).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status,
        latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        client = %client,
        user_agent = %user_agent,
        "Request completed"
    );
    metrics::counter!(
        "atlas_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("atlas_http_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());

    response
}
