//! Sign-up and login.
//!
//! Accounts are `Person` nodes carrying `username`, an Argon2id `password`
//! hash and `phone`. Both operations return a freshly signed bearer token.

use crate::models::{LoginRequest, SignUpRequest, TokenResponse};
use crate::security::{JwtAuthority, hash_password, verify_password};
use crate::storage::{CypherQuery, GraphStore};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Message returned when sign-up finds an existing account.
pub const DUPLICATE_ACCOUNT: &str = "Username or phone number already exists!";

/// Message returned when login finds no single matching account.
pub const ACCOUNT_NOT_FOUND: &str = "Username and password combo not found!";

/// Message returned when the password does not verify.
pub const BAD_CREDENTIALS: &str = "invalid username or password";

/// Account service.
pub struct AccountService {
    graph: Arc<dyn GraphStore>,
    tokens: Arc<JwtAuthority>,
}

impl AccountService {
    /// Creates a new account service.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>, tokens: Arc<JwtAuthority>) -> Self {
        Self { graph, tokens }
    }

    /// Registers a new account and returns a token for it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if any field is empty
    /// - [`Error::AlreadyExists`] if the username or phone is taken
    /// - [`Error::OperationFailed`] if hashing or the database fails
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<TokenResponse> {
        let username = request.username.trim();
        let phone = request.phone.trim();
        if username.is_empty() || phone.is_empty() || request.password.is_empty() {
            return Err(Error::InvalidInput("invalid request".to_string()));
        }

        let existing = self
            .graph
            .execute(
                CypherQuery::new(
                    "MATCH (n:Person)\n\
                     WHERE n.phone = $phone OR n.username = $username\n\
                     RETURN elementId(n) AS id",
                )
                .param("phone", phone)
                .param("username", username)
                .returns(["id"]),
            )
            .await?;
        if !existing.is_empty() {
            return Err(Error::AlreadyExists(DUPLICATE_ACCOUNT.to_string()));
        }

        let password = hash_password(&request.password)?;
        self.graph
            .execute(
                CypherQuery::new(
                    "CREATE (p:Person:L3 {username: $username, password: $password, phone: $phone})\n\
                     RETURN elementId(p) AS id",
                )
                .param("username", username)
                .param("password", password)
                .param("phone", phone)
                .returns(["id"]),
            )
            .await?;

        tracing::info!("Account created");
        metrics::counter!("atlas_accounts_created_total").increment(1);

        Ok(TokenResponse {
            token: self.tokens.issue(username)?,
        })
    }

    /// Verifies credentials and returns a token.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if username or password is empty
    /// - [`Error::Unauthorized`] if the account is unknown or the password
    ///   does not match
    /// - [`Error::OperationFailed`] if the database fails
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse> {
        let username = request.username.trim();
        if username.is_empty() || request.password.is_empty() {
            return Err(Error::InvalidInput("invalid request".to_string()));
        }

        let rows = self
            .graph
            .execute(
                CypherQuery::new(
                    "MATCH (n:Person)\n\
                     WHERE n.username = $username\n\
                     RETURN n.password AS password",
                )
                .param("username", username)
                .returns(["password"]),
            )
            .await?;

        let [row] = rows.as_slice() else {
            tracing::info!(matches = rows.len(), "Login rejected");
            return Err(Error::Unauthorized(ACCOUNT_NOT_FOUND.to_string()));
        };
        let Some(stored_hash) = row.get_str("password") else {
            return Err(Error::Unauthorized(ACCOUNT_NOT_FOUND.to_string()));
        };

        if !verify_password(&request.password, stored_hash)? {
            tracing::info!("Login rejected: password mismatch");
            return Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        Ok(TokenResponse {
            token: self.tokens.issue(username)?,
        })
    }
}
