//! Authentication and abuse protection.
//!
//! - [`passwords`]: Argon2id password hashing
//! - [`tokens`]: HS256 JWT issuance and validation
//! - [`rate_limit`]: fixed-window per-client request limiting

pub mod passwords;
pub mod rate_limit;
pub mod tokens;

pub use passwords::{hash_password, verify_password};
pub use rate_limit::{RateLimitConfig, RateLimitDecision, RateLimiter};
pub use tokens::{Claims, JwtAuthority, JwtConfig};
