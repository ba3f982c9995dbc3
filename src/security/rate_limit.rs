//! Fixed-window per-client rate limiting.
//!
//! Each client key gets a counter and a window start. The counter resets
//! once the window has elapsed; requests beyond `max_requests` inside one
//! window are rejected until it does.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default maximum requests per window.
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: usize = 60;

/// Default rate limit window duration (1 minute).
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Client count above which expired windows are swept on insert.
const SWEEP_THRESHOLD: usize = 10_000;

/// Rate limit configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: usize,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        }
    }
}

impl RateLimitConfig {
    /// Sets maximum requests per window.
    #[must_use]
    pub const fn with_max_requests(mut self, max: usize) -> Self {
        self.max_requests = max;
        self
    }

    /// Sets window duration in seconds.
    #[must_use]
    pub const fn with_window_secs(mut self, secs: u64) -> Self {
        self.window = Duration::from_secs(secs);
        self
    }
}

/// Per-client rate limit state.
#[derive(Debug, Clone)]
struct ClientWindow {
    /// Number of requests in the current window.
    request_count: usize,
    /// Start of the current rate limit window.
    window_start: Instant,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request is admitted; `remaining` more fit in this window.
    Allowed {
        /// Requests left in the current window.
        remaining: usize,
    },
    /// The request exceeds the window budget.
    Limited {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    /// Returns true when the request was admitted.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Fixed-window rate limiter keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Mutex<HashMap<String, ClientWindow>>,
}

impl RateLimiter {
    /// Creates a limiter with the given configuration.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the limiter configuration.
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Records a request for `client` and decides whether it is admitted.
    pub fn check(&self, client: &str) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        let window = self.config.window;
        let max = self.config.max_requests;

        // A poisoned lock only means another request panicked mid-update;
        // the counters are still usable.
        let mut clients = match self.clients.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if clients.len() > SWEEP_THRESHOLD {
            clients.retain(|_, state| now.duration_since(state.window_start) <= window);
        }

        let state = clients
            .entry(client.to_string())
            .or_insert_with(|| ClientWindow {
                request_count: 0,
                window_start: now,
            });

        // Reset window if expired
        if now.duration_since(state.window_start) > window {
            state.request_count = 0;
            state.window_start = now;
        }

        if state.request_count >= max {
            let elapsed = now.duration_since(state.window_start);
            return RateLimitDecision::Limited {
                retry_after: window.saturating_sub(elapsed),
            };
        }

        state.request_count += 1;
        RateLimitDecision::Allowed {
            remaining: max - state.request_count,
        }
    }
}
