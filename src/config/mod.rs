//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables (after `.env` has been loaded by the binary).
//!
//! ```toml
//! [server]
//! listen_addr = "0.0.0.0:8000"
//! allowed_origins = ["http://localhost:5173"]
//!
//! [neo4j]
//! uri = "127.0.0.1:7687"
//! user = "neo4j"
//!
//! [graph]
//! similarity_threshold = 0.7
//! ```

mod env;
mod file;

pub use file::{
    ConfigFile, ConfigFileAuth, ConfigFileEmbedding, ConfigFileGraph, ConfigFileImageGeneration,
    ConfigFileNeo4j, ConfigFileRateLimit, ConfigFileServer, ConfigFileStorage, LoggingSettings,
    MetricsSettings, ObservabilitySettings,
};

use crate::security::RateLimitConfig;
use crate::{Error, Result};
use secrecy::SecretString;
use std::net::SocketAddr;
use std::path::Path;

/// Default listen address for the HTTP server.
const DEFAULT_LISTEN_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);

/// Default maximum request body size (10 MiB, sized for image uploads).
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Main configuration for the atlas service.
#[derive(Debug, Clone, Default)]
pub struct AtlasConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Neo4j connection settings.
    pub neo4j: Neo4jConfig,
    /// Token issuance settings.
    pub auth: AuthConfig,
    /// Fixed-window rate limit.
    pub rate_limit: RateLimitConfig,
    /// Embedding endpoint settings.
    pub embedding: EmbeddingConfig,
    /// Image generation endpoint settings.
    pub image_generation: ImageGenerationConfig,
    /// Object storage settings.
    pub storage: StorageConfig,
    /// Graph query tuning.
    pub graph: GraphConfig,
    /// Logging and metrics settings from the config file.
    pub observability: ObservabilitySettings,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub listen_addr: SocketAddr,
    /// Origins allowed by CORS. Empty means no cross-origin access.
    pub allowed_origins: Vec<String>,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(DEFAULT_LISTEN_ADDR),
            allowed_origins: Vec::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Neo4j connection configuration.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// Bolt URI (`host:port` or `neo4j://host:port`).
    pub uri: String,
    /// Username.
    pub user: String,
    /// Password.
    pub password: SecretString,
    /// Database name.
    pub database: String,
    /// Connection pool size.
    pub max_connections: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "127.0.0.1:7687".to_string(),
            user: "neo4j".to_string(),
            password: SecretString::from("neo4j".to_string()),
            database: "neo4j".to_string(),
            max_connections: 16,
        }
    }
}

/// Token issuance configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret. Required to serve.
    pub jwt_secret: Option<SecretString>,
    /// Token lifetime in hours.
    pub token_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24,
        }
    }
}

/// Embedding endpoint configuration.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Endpoint that accepts `{"content": "..."}` and returns embeddings.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Dimensions of the vectors the endpoint produces.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::embedding::HttpEmbedder::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            dimensions: 768,
        }
    }
}

/// Image generation endpoint configuration.
///
/// Image generation is disabled when no endpoint is configured; nodes are
/// then created without an `image` property.
#[derive(Debug, Clone)]
pub struct ImageGenerationConfig {
    /// Endpoint URL.
    pub endpoint: Option<String>,
    /// Optional bearer token.
    pub api_key: Option<SecretString>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Diffusion steps.
    pub steps: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ImageGenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            width: 1024,
            height: 1024,
            steps: 8,
            timeout_secs: 120,
        }
    }
}

/// Object storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Amazon S3.
    #[default]
    S3,
    /// Process-local memory (development and tests).
    Memory,
}

impl StorageBackend {
    /// Parses a backend name, defaulting to S3.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" | "in-memory" => Self::Memory,
            _ => Self::S3,
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend to use.
    pub backend: StorageBackend,
    /// Default bucket for generated images and helper routes.
    pub bucket: Option<String>,
    /// AWS region.
    pub region: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            bucket: None,
            region: "us-east-2".to_string(),
        }
    }
}

/// Graph query tuning.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Name of the vector index used for similarity search.
    pub vector_index: String,
    /// Label the vector index is built on.
    pub vector_label: String,
    /// Score above which node creation is rejected as a duplicate.
    pub similarity_threshold: f64,
    /// Maximum relationship expansion depth.
    pub max_depth: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            vector_index: "nodeEmbeddings".to_string(),
            vector_label: "L1".to_string(),
            similarity_threshold: 0.7,
            max_depth: 5,
        }
    }
}

impl AtlasConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from an explicit file or the default location,
    /// then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        env::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/atlas/` on macOS)
    /// 2. XDG config dir (`~/.config/atlas/`)
    ///
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("atlas").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("atlas")
                .join("config.toml"),
        ];

        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Converts a [`ConfigFile`] to [`AtlasConfig`].
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(server) = file.server {
            if let Some(addr) = server.listen_addr {
                config.server.listen_addr = parse_listen_addr(&addr)?;
            }
            if let Some(origins) = server.allowed_origins {
                config.server.allowed_origins = origins;
            }
            if let Some(max) = server.max_body_bytes {
                config.server.max_body_bytes = max;
            }
        }
        if let Some(neo4j) = file.neo4j {
            if let Some(uri) = neo4j.uri {
                config.neo4j.uri = uri;
            }
            if let Some(user) = neo4j.user {
                config.neo4j.user = user;
            }
            if let Some(password) = neo4j.password {
                config.neo4j.password = SecretString::from(password);
            }
            if let Some(database) = neo4j.database {
                config.neo4j.database = database;
            }
            if let Some(max) = neo4j.max_connections {
                config.neo4j.max_connections = max;
            }
        }
        if let Some(auth) = file.auth {
            config.auth.jwt_secret = auth.jwt_secret.map(SecretString::from);
            if let Some(ttl) = auth.token_ttl_hours {
                config.auth.token_ttl_hours = ttl;
            }
        }
        if let Some(rate_limit) = file.rate_limit {
            if let Some(max) = rate_limit.max_requests {
                config.rate_limit = config.rate_limit.with_max_requests(max);
            }
            if let Some(secs) = rate_limit.window_secs {
                config.rate_limit = config.rate_limit.with_window_secs(secs);
            }
        }
        if let Some(embedding) = file.embedding {
            if let Some(endpoint) = embedding.endpoint {
                config.embedding.endpoint = endpoint;
            }
            if let Some(timeout) = embedding.timeout_secs {
                config.embedding.timeout_secs = timeout;
            }
            if let Some(dimensions) = embedding.dimensions {
                config.embedding.dimensions = dimensions;
            }
        }
        if let Some(images) = file.image_generation {
            config.image_generation.endpoint = images.endpoint;
            config.image_generation.api_key = images.api_key.map(SecretString::from);
            if let Some(width) = images.width {
                config.image_generation.width = width;
            }
            if let Some(height) = images.height {
                config.image_generation.height = height;
            }
            if let Some(steps) = images.steps {
                config.image_generation.steps = steps;
            }
            if let Some(timeout) = images.timeout_secs {
                config.image_generation.timeout_secs = timeout;
            }
        }
        if let Some(storage) = file.storage {
            if let Some(backend) = storage.backend {
                config.storage.backend = StorageBackend::parse(&backend);
            }
            config.storage.bucket = storage.bucket;
            if let Some(region) = storage.region {
                config.storage.region = region;
            }
        }
        if let Some(graph) = file.graph {
            if let Some(index) = graph.vector_index {
                config.graph.vector_index = index;
            }
            if let Some(label) = graph.vector_label {
                config.graph.vector_label = label;
            }
            if let Some(threshold) = graph.similarity_threshold {
                config.graph.similarity_threshold = threshold;
            }
            if let Some(depth) = graph.max_depth {
                config.graph.max_depth = depth;
            }
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        Ok(config)
    }

    /// Sets the listen address.
    #[must_use]
    pub const fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.server.listen_addr = addr;
        self
    }

    /// Sets the JWT signing secret.
    #[must_use]
    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth.jwt_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Sets the default object storage bucket.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.storage.bucket = Some(bucket.into());
        self
    }

    /// Sets the CORS allowed origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.server.allowed_origins = origins;
        self
    }
}

/// Parses a listen address, accepting a bare port as shorthand.
fn parse_listen_addr(value: &str) -> Result<SocketAddr> {
    let value = value.trim();
    if let Ok(port) = value.parse::<u16>() {
        return Ok(SocketAddr::from((DEFAULT_LISTEN_ADDR.0, port)));
    }
    value
        .parse()
        .map_err(|e| Error::InvalidInput(format!("invalid listen address '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::new();
        assert_eq!(config.server.listen_addr.port(), 8000);
        assert_eq!(config.neo4j.database, "neo4j");
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.rate_limit.max_requests, 60);
        assert_eq!(config.graph.vector_index, "nodeEmbeddings");
        assert!((config.graph.similarity_threshold - 0.7).abs() < f64::EPSILON);
        assert!(config.image_generation.endpoint.is_none());
        assert_eq!(config.storage.backend, StorageBackend::S3);
    }

    #[test]
    fn test_from_toml_sections() {
        let config = AtlasConfig::from_toml(
            r#"
            [server]
            listen_addr = "127.0.0.1:9000"
            allowed_origins = ["http://localhost:5173"]

            [neo4j]
            uri = "neo4j://graph:7687"
            password = "hunter2-but-longer"

            [auth]
            jwt_secret = "from-file"
            token_ttl_hours = 12

            [rate_limit]
            max_requests = 5
            window_secs = 10

            [storage]
            backend = "memory"
            bucket = "atlas-images"

            [graph]
            max_depth = 3

            [observability.logging]
            format = "json"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.server.listen_addr.port(), 9000);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.neo4j.uri, "neo4j://graph:7687");
        assert_eq!(config.neo4j.password.expose_secret(), "hunter2-but-longer");
        assert_eq!(
            config.auth.jwt_secret.as_ref().map(ExposeSecret::expose_secret),
            Some("from-file")
        );
        assert_eq!(config.auth.token_ttl_hours, 12);
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window.as_secs(), 10);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.bucket.as_deref(), Some("atlas-images"));
        assert_eq!(config.graph.max_depth, 3);
        assert_eq!(
            config
                .observability
                .logging
                .as_ref()
                .and_then(|l| l.format.as_deref()),
            Some("json")
        );
    }

    #[test]
    fn test_bare_port_listen_addr() {
        let config = AtlasConfig::from_toml("[server]\nlisten_addr = \"8081\"\n")
            .expect("config should parse");
        assert_eq!(config.server.listen_addr, SocketAddr::from(([0, 0, 0, 0], 8081)));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result = AtlasConfig::from_toml("[server\nlisten_addr = ");
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[embedding]\nendpoint = \"http://embedder/embedding\"").expect("write");

        let config = AtlasConfig::load_from_file(file.path()).expect("config should load");
        assert_eq!(config.embedding.endpoint, "http://embedder/embedding");
    }

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(StorageBackend::parse("memory"), StorageBackend::Memory);
        assert_eq!(StorageBackend::parse("S3"), StorageBackend::S3);
        assert_eq!(StorageBackend::parse("anything"), StorageBackend::S3);
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let config = AtlasConfig::new().with_jwt_secret("do-not-print-this-secret-value");
        let debug = format!("{config:?}");
        assert!(!debug.contains("do-not-print-this-secret-value"));
    }
}
