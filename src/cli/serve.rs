//! `serve` command.

use crate::http::{self, AppState, Dependencies};
use crate::{AtlasConfig, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;

/// Connects the backends and serves the API until shutdown.
///
/// # Errors
///
/// Returns an error if the JWT secret is invalid, a backend cannot be
/// reached, or the listener fails.
pub async fn serve(
    mut config: AtlasConfig,
    listen: Option<SocketAddr>,
    prometheus: Option<PrometheusHandle>,
) -> Result<()> {
    if let Some(addr) = listen {
        config.server.listen_addr = addr;
    }

    let deps = Dependencies::connect(&config).await?;
    let state = AppState::new(deps, &config)?.with_prometheus(prometheus);
    let app = http::router(state, &config.server);

    http::serve(app, config.server.listen_addr).await
}
