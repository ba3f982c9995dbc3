//! Environment variable overrides.
//!
//! Variable names follow the deployment conventions of the service
//! (`NEO4J_URI`, `JWT_SECRET`, `S3_BUCKET`, ...) with `ATLAS_` prefixed
//! names for settings that have no established name.

use super::{AtlasConfig, StorageBackend};
use secrecy::SecretString;
use std::net::SocketAddr;

/// Applies overrides from the process environment.
pub(super) fn apply_env_overrides(config: &mut AtlasConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Applies overrides using `lookup` to resolve variable names.
pub(super) fn apply_overrides_from<F>(config: &mut AtlasConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let number = |key: &str| string(key).and_then(|value| value.parse::<u64>().ok());

    if let Some(addr) = string("ATLAS_LISTEN_ADDR").and_then(|v| v.parse::<SocketAddr>().ok()) {
        config.server.listen_addr = addr;
    } else if let Some(port) = string("SERVER_PORT").and_then(|v| v.parse::<u16>().ok()) {
        config.server.listen_addr.set_port(port);
    }
    if let Some(origins) = string("ALLOWED_ORIGIN") {
        config.server.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(ToString::to_string)
            .collect();
    }
    if let Some(max) = number("ATLAS_MAX_BODY_BYTES").and_then(|v| usize::try_from(v).ok()) {
        config.server.max_body_bytes = max;
    }

    if let Some(uri) = string("NEO4J_URI") {
        config.neo4j.uri = uri;
    }
    if let Some(user) = string("NEO4J_USER") {
        config.neo4j.user = user;
    }
    if let Some(password) = string("NEO4J_PASSWORD") {
        config.neo4j.password = SecretString::from(password);
    }
    if let Some(database) = string("NEO4J_DATABASE") {
        config.neo4j.database = database;
    }
    if let Some(max) = number("NEO4J_MAX_CONNECTIONS").and_then(|v| usize::try_from(v).ok()) {
        config.neo4j.max_connections = max;
    }

    if let Some(secret) = string("JWT_SECRET") {
        config.auth.jwt_secret = Some(SecretString::from(secret));
    }
    if let Some(ttl) = number("ATLAS_TOKEN_TTL_HOURS") {
        config.auth.token_ttl_hours = ttl;
    }

    if let Some(max) = number("ATLAS_RATE_LIMIT_MAX_REQUESTS").and_then(|v| usize::try_from(v).ok())
    {
        config.rate_limit = config.rate_limit.clone().with_max_requests(max);
    }
    if let Some(secs) = number("ATLAS_RATE_LIMIT_WINDOW_SECS") {
        config.rate_limit = config.rate_limit.clone().with_window_secs(secs);
    }

    if let Some(endpoint) = string("EMBEDDING_ENDPOINT") {
        config.embedding.endpoint = endpoint;
    }

    if let Some(endpoint) = string("IMAGE_GEN_ENDPOINT") {
        config.image_generation.endpoint = Some(endpoint);
    }
    if let Some(key) = string("IMAGE_GEN_API_KEY") {
        config.image_generation.api_key = Some(SecretString::from(key));
    }

    if let Some(backend) = string("ATLAS_STORAGE_BACKEND") {
        config.storage.backend = StorageBackend::parse(&backend);
    }
    if let Some(bucket) = string("S3_BUCKET") {
        config.storage.bucket = Some(bucket);
    }
    if let Some(region) = string("AWS_REGION") {
        config.storage.region = region;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> AtlasConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut config = AtlasConfig::default();
        apply_overrides_from(&mut config, |key| vars.get(key).cloned());
        config
    }

    #[test]
    fn test_no_vars_keeps_defaults() {
        let config = apply(&[]);
        assert_eq!(config.server.listen_addr.port(), 8000);
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn test_deployment_variables() {
        let config = apply(&[
            ("NEO4J_URI", "neo4j://db:7687"),
            ("NEO4J_PASSWORD", "s3cret"),
            ("SERVER_PORT", "9001"),
            ("ALLOWED_ORIGIN", "http://a.example, http://b.example"),
            ("JWT_SECRET", "env-secret"),
            ("S3_BUCKET", "atlas"),
            ("AWS_REGION", "eu-west-1"),
            ("IMAGE_GEN_ENDPOINT", "http://imagegen/generate"),
        ]);

        assert_eq!(config.neo4j.uri, "neo4j://db:7687");
        assert_eq!(config.neo4j.password.expose_secret(), "s3cret");
        assert_eq!(config.server.listen_addr.port(), 9001);
        assert_eq!(
            config.server.allowed_origins,
            vec!["http://a.example", "http://b.example"]
        );
        assert_eq!(
            config.auth.jwt_secret.as_ref().map(ExposeSecret::expose_secret),
            Some("env-secret")
        );
        assert_eq!(config.storage.bucket.as_deref(), Some("atlas"));
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(
            config.image_generation.endpoint.as_deref(),
            Some("http://imagegen/generate")
        );
    }

    #[test]
    fn test_listen_addr_takes_precedence_over_port() {
        let config = apply(&[("ATLAS_LISTEN_ADDR", "127.0.0.1:7000"), ("SERVER_PORT", "9001")]);
        assert_eq!(config.server.listen_addr, SocketAddr::from(([127, 0, 0, 1], 7000)));
    }

    #[test]
    fn test_blank_and_unparseable_values_are_ignored() {
        let config = apply(&[
            ("NEO4J_USER", "   "),
            ("ATLAS_RATE_LIMIT_MAX_REQUESTS", "lots"),
        ]);
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.rate_limit.max_requests, 60);
    }

    #[test]
    fn test_rate_limit_overrides() {
        let config = apply(&[
            ("ATLAS_RATE_LIMIT_MAX_REQUESTS", "120"),
            ("ATLAS_RATE_LIMIT_WINDOW_SECS", "30"),
        ]);
        assert_eq!(config.rate_limit.max_requests, 120);
        assert_eq!(config.rate_limit.window.as_secs(), 30);
    }
}
