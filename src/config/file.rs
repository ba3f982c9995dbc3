//! TOML configuration file structure.

use serde::Deserialize;

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// HTTP server section.
    pub server: Option<ConfigFileServer>,
    /// Neo4j section.
    pub neo4j: Option<ConfigFileNeo4j>,
    /// Auth section.
    pub auth: Option<ConfigFileAuth>,
    /// Rate limit section.
    pub rate_limit: Option<ConfigFileRateLimit>,
    /// Embedding section.
    pub embedding: Option<ConfigFileEmbedding>,
    /// Image generation section.
    pub image_generation: Option<ConfigFileImageGeneration>,
    /// Object storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Graph tuning section.
    pub graph: Option<ConfigFileGraph>,
    /// Logging and metrics section.
    pub observability: Option<ObservabilitySettings>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileServer {
    /// Listen address or bare port.
    pub listen_addr: Option<String>,
    /// CORS origins.
    pub allowed_origins: Option<Vec<String>>,
    /// Body size limit.
    pub max_body_bytes: Option<usize>,
}

/// Neo4j section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileNeo4j {
    /// Bolt URI.
    pub uri: Option<String>,
    /// Username.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Database name.
    pub database: Option<String>,
    /// Pool size.
    pub max_connections: Option<usize>,
}

/// Auth section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileAuth {
    /// HS256 signing secret.
    pub jwt_secret: Option<String>,
    /// Token lifetime in hours.
    pub token_ttl_hours: Option<u64>,
}

/// Rate limit section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRateLimit {
    /// Requests allowed per window.
    pub max_requests: Option<usize>,
    /// Window length in seconds.
    pub window_secs: Option<u64>,
}

/// Embedding section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileEmbedding {
    /// Endpoint URL.
    pub endpoint: Option<String>,
    /// Timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Vector dimensions.
    pub dimensions: Option<usize>,
}

/// Image generation section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileImageGeneration {
    /// Endpoint URL.
    pub endpoint: Option<String>,
    /// Bearer token.
    pub api_key: Option<String>,
    /// Width in pixels.
    pub width: Option<u32>,
    /// Height in pixels.
    pub height: Option<u32>,
    /// Diffusion steps.
    pub steps: Option<u32>,
    /// Timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// `s3` or `memory`.
    pub backend: Option<String>,
    /// Default bucket.
    pub bucket: Option<String>,
    /// AWS region.
    pub region: Option<String>,
}

/// Graph section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileGraph {
    /// Vector index name.
    pub vector_index: Option<String>,
    /// Label the vector index covers.
    pub vector_label: Option<String>,
    /// Duplicate detection threshold.
    pub similarity_threshold: Option<f64>,
    /// Maximum expansion depth.
    pub max_depth: Option<u32>,
}

/// Observability settings from the config file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilitySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// Logging settings from the config file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// `EnvFilter` directive, e.g. `atlas=debug,tower_http=info`.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<String>,
}

/// Metrics settings from the config file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MetricsSettings {
    /// Whether to install the Prometheus recorder and serve `/metrics`.
    pub enabled: Option<bool>,
}
