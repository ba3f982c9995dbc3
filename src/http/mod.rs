//! HTTP/JSON API.
//!
//! # Routes
//!
//! | Prefix | Auth | Routes |
//! |--------|------|--------|
//! | `/api` | none | `/`, `healthcheck`, `sign-up`, `login` |
//! | `/api/secure/graph` | bearer | node and relationship CRUD, similarity and text search, domains |
//! | `/api/secure/helper` | bearer | `s3-object`, `s3-upload`, `embedding` |
//! | `/api/secure/profile` | bearer | `user-profile/{username}` |
//! | `/metrics` | none | Prometheus text, when metrics are enabled |
//!
//! Every response carries `x-request-id` and the security headers; every
//! request is rate limited per client.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, Dependencies};

use crate::config::ServerConfig;
use crate::{Error, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::{get, post, put};
use handlers::{accounts, graph, health, helper, profile};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let public = Router::new()
        .route("/api", get(health::root))
        .route("/api/", get(health::root))
        .route("/api/healthcheck", get(health::healthcheck))
        .route("/api/sign-up", post(accounts::sign_up))
        .route("/api/login", post(accounts::login));

    let secure = Router::new()
        .route("/api/secure/graph/get-nodes", get(graph::get_nodes))
        .route(
            "/api/secure/graph/get-node-with-relationships-by-search-term",
            get(graph::node_by_search_term),
        )
        .route("/api/secure/graph/create-node", post(graph::create_node))
        .route("/api/secure/graph/update-node", put(graph::update_node))
        .route(
            "/api/secure/graph/create-relationship",
            post(graph::create_relationship),
        )
        .route(
            "/api/secure/graph/update-relationship",
            put(graph::update_relationship),
        )
        .route(
            "/api/secure/graph/delete-relationship",
            post(graph::delete_relationship),
        )
        .route("/api/secure/graph/similar-nodes", post(graph::similar_nodes))
        .route("/api/secure/graph/search-nodes", get(graph::search_nodes))
        .route("/api/secure/graph/domain", get(graph::get_domain))
        .route(
            "/api/secure/graph/validate-domain-name",
            get(graph::validate_domain_name),
        )
        .route("/api/secure/graph/create-domain", post(graph::create_domain))
        .route("/api/secure/graph/update-domain", put(graph::update_domain))
        .route("/api/secure/helper/s3-object", get(helper::s3_object))
        .route("/api/secure/helper/s3-upload", post(helper::s3_upload))
        .route("/api/secure/helper/embedding", post(helper::embedding))
        .route(
            "/api/secure/profile/user-profile/{username}",
            get(profile::user_profile),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_jwt,
        ));

    let mut app = public.merge(secure);
    if state.prometheus.is_some() {
        app = app.route("/metrics", get(health::metrics));
    }

    app.layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::enforce_rate_limit,
    ))
    .layer(DefaultBodyLimit::max(server.max_body_bytes))
    // Security headers (OWASP recommendations)
    .layer(SetResponseHeaderLayer::overriding(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("DENY"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-permitted-cross-domain-policies"),
        HeaderValue::from_static("none"),
    ))
    .layer(cors_layer(&server.allowed_origins))
    .layer(axum::middleware::from_fn(middleware::track_requests))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// CORS for the configured origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| {
            if *origin == "*" {
                tracing::warn!("Ignoring wildcard CORS origin; credentials require explicit origins");
                return false;
            }
            !origin.is_empty()
        })
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin, error = %e, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Serves `app` on `addr` until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(app: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::operation("bind", format!("{addr}: {e}")))?;
    tracing::info!(%addr, "Atlas API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| Error::operation("serve", e))?;

    tracing::info!("Atlas API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
