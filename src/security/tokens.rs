//! JWT issuance and validation for the secure API routes.
//!
//! Tokens are HS256-signed and carry the username as both subject and
//! issuer. They expire after the configured lifetime (24 hours by default).
//!
//! # Configuration
//!
//! - `JWT_SECRET`: Required. At least 32 characters with reasonable entropy.
//! - `ATLAS_TOKEN_TTL_HOURS`: Optional. Token lifetime in hours.
//!
//! ```bash
//! export JWT_SECRET="$(atlas generate-key)"
//! atlas serve
//! ```

use crate::config::AuthConfig;
use crate::{Error, Result, current_timestamp};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Minimum secret key length for security.
const MIN_SECRET_LENGTH: usize = 32;

/// Minimum number of unique characters for entropy validation.
/// A 32+ character secret with fewer than 8 unique chars is likely weak.
const MIN_UNIQUE_CHARS: usize = 8;

/// Validates that a secret has sufficient entropy (not just length).
fn validate_secret_entropy(secret: &str) -> std::result::Result<(), String> {
    let unique_chars: HashSet<char> = secret.chars().collect();
    if unique_chars.len() < MIN_UNIQUE_CHARS {
        return Err(format!(
            "JWT secret has insufficient entropy: only {} unique characters (minimum: {})",
            unique_chars.len(),
            MIN_UNIQUE_CHARS
        ));
    }

    let lowercase = secret.to_lowercase();
    let weak_patterns = [
        "password", "secret", "123456", "abcdef", "qwerty", "000000", "111111", "aaaaaa",
    ];

    for pattern in weak_patterns {
        if lowercase.contains(pattern) {
            return Err(format!("JWT secret contains weak pattern '{pattern}'"));
        }
    }

    Ok(())
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
    /// Issued at time (Unix timestamp).
    #[serde(default)]
    pub iat: u64,
    /// Issuer (username, kept for clients that read it).
    #[serde(default)]
    pub iss: Option<String>,
}

/// JWT configuration.
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HS256 signing and validation.
    secret: String,
    /// Token lifetime in seconds.
    ttl_secs: u64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl JwtConfig {
    /// Builds a validated JWT configuration from the auth settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret is configured, the secret is shorter than
    /// 32 characters, or it has insufficient entropy.
    pub fn from_auth_config(auth: &AuthConfig) -> Result<Self> {
        let secret = auth
            .jwt_secret
            .as_ref()
            .map(|s| s.expose_secret().to_string())
            .ok_or_else(|| Error::OperationFailed {
                operation: "jwt_config".to_string(),
                cause: "JWT_SECRET is not configured".to_string(),
            })?;

        if secret.len() < MIN_SECRET_LENGTH {
            return Err(Error::OperationFailed {
                operation: "jwt_config".to_string(),
                cause: format!(
                    "JWT secret must be at least {MIN_SECRET_LENGTH} characters (got {})",
                    secret.len()
                ),
            });
        }

        validate_secret_entropy(&secret).map_err(|cause| Error::OperationFailed {
            operation: "jwt_config".to_string(),
            cause,
        })?;

        Ok(Self::new(secret).with_ttl_hours(auth.token_ttl_hours))
    }

    /// Creates a JWT configuration with explicit values, skipping validation.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs: 24 * 60 * 60,
        }
    }

    /// Sets the token lifetime in hours.
    #[must_use]
    pub const fn with_ttl_hours(mut self, hours: u64) -> Self {
        self.ttl_secs = hours.saturating_mul(60 * 60);
        self
    }
}

/// Issues and validates bearer tokens.
#[derive(Clone)]
pub struct JwtAuthority {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
    ttl_secs: u64,
}

impl fmt::Debug for JwtAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthority")
            .field("validation", &self.validation)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl JwtAuthority {
    /// Creates a new authority from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let encoding_key = Arc::new(EncodingKey::from_secret(config.secret.as_bytes()));
        let decoding_key = Arc::new(DecodingKey::from_secret(config.secret.as_bytes()));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key,
            decoding_key,
            validation,
            ttl_secs: config.ttl_secs,
        }
    }

    /// Issues a signed token for `username`.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = current_timestamp();
        let claims = Claims {
            sub: username.to_string(),
            exp: now.saturating_add(self.ttl_secs),
            iat: now,
            iss: Some(username.to_string()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::operation("jwt_issue", e))
    }

    /// Validates a bearer token and returns the claims.
    ///
    /// # Arguments
    ///
    /// * `token` - The JWT token (without "Bearer " prefix).
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid, expired, or fails validation.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::warn!(error = %e, "JWT validation failed");
                Error::Unauthorized(format!("Invalid token: {e}"))
            })?;

        tracing::debug!(sub = %token_data.claims.sub, "JWT validated successfully");

        Ok(token_data.claims)
    }

    /// Extracts and validates a bearer token from an Authorization header.
    ///
    /// # Arguments
    ///
    /// * `auth_header` - The full Authorization header value (e.g., `Bearer <token>`).
    ///
    /// # Errors
    ///
    /// Returns an error if the header format is invalid or token validation fails.
    pub fn validate_header(&self, auth_header: &str) -> Result<Claims> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                Error::Unauthorized("Invalid Authorization header format".to_string())
            })?;

        self.validate(token)
    }
}
