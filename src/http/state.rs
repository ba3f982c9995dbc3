//! Shared handler state and backend wiring.

use crate::config::{AtlasConfig, StorageBackend};
use crate::embedding::{Embedder, HttpEmbedder};
use crate::imaging::{HttpImageGenerator, ImageGenerator};
use crate::security::{JwtAuthority, JwtConfig, RateLimiter};
use crate::services::{AccountService, AssetService, GraphService, ProfileService};
use crate::storage::{
    GraphStore, MemoryObjectStore, Neo4jGraphStore, ObjectStore, S3ObjectStore,
};
use crate::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Backends the services run against.
#[derive(Clone)]
pub struct Dependencies {
    /// Graph database.
    pub graph: Arc<dyn GraphStore>,
    /// Text embedder.
    pub embedder: Arc<dyn Embedder>,
    /// Optional node image generator.
    pub images: Option<Arc<dyn ImageGenerator>>,
    /// Object storage.
    pub objects: Arc<dyn ObjectStore>,
}

impl Dependencies {
    /// Connects the production backends described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if Neo4j is unreachable or an HTTP client cannot be
    /// built.
    pub async fn connect(config: &AtlasConfig) -> Result<Self> {
        let graph = Arc::new(Neo4jGraphStore::connect(&config.neo4j).await?);
        let embedder = Arc::new(HttpEmbedder::new(&config.embedding)?);
        let images = HttpImageGenerator::from_config(&config.image_generation)?
            .map(|generator| Arc::new(generator) as Arc<dyn ImageGenerator>);

        let objects: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::S3 => Arc::new(S3ObjectStore::from_env(&config.storage.region).await),
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory object storage; uploads are lost on restart");
                Arc::new(MemoryObjectStore::new())
            },
        };

        Ok(Self {
            graph,
            embedder,
            images,
            objects,
        })
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) accounts: Arc<AccountService>,
    pub(crate) graph: Arc<GraphService>,
    pub(crate) profiles: Arc<ProfileService>,
    pub(crate) assets: Arc<AssetService>,
    pub(crate) tokens: Arc<JwtAuthority>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) graph_store: Arc<dyn GraphStore>,
    pub(crate) prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires services over `deps`.
    ///
    /// Image generation is only enabled when a default bucket is configured
    /// to receive the images.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWT secret is missing or too weak.
    pub fn new(deps: Dependencies, config: &AtlasConfig) -> Result<Self> {
        let tokens = Arc::new(JwtAuthority::new(&JwtConfig::from_auth_config(&config.auth)?));

        let mut graph = GraphService::new(
            deps.graph.clone(),
            deps.embedder.clone(),
            config.graph.clone(),
        );
        match (deps.images, config.storage.bucket.as_deref()) {
            (Some(generator), Some(bucket)) => {
                graph = graph.with_images(generator, deps.objects.clone(), bucket);
            },
            (Some(_), None) => {
                tracing::warn!("Image generation disabled: no default bucket configured");
            },
            (None, _) => {},
        }

        Ok(Self {
            accounts: Arc::new(AccountService::new(deps.graph.clone(), tokens.clone())),
            graph: Arc::new(graph),
            profiles: Arc::new(ProfileService::new(deps.graph.clone())),
            assets: Arc::new(AssetService::new(
                deps.objects,
                config.storage.bucket.clone(),
            )),
            tokens,
            limiter: Arc::new(RateLimiter::new(config.rate_limit.clone())),
            graph_store: deps.graph,
            prometheus: None,
        })
    }

    /// Serves `/metrics` from `handle`.
    #[must_use]
    pub fn with_prometheus(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.prometheus = handle;
        self
    }

    /// Returns the token authority.
    #[must_use]
    pub fn tokens(&self) -> &JwtAuthority {
        &self.tokens
    }
}
