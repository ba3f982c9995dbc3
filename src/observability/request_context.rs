//! Per-request context for log correlation.
//!
//! The HTTP layer scopes a [`RequestContext`] around each request so code
//! further down the stack can tag events with the request id and client key
//! without threading them through every call.

use std::future::Future;
use uuid::Uuid;

/// Longest client-supplied request id that is accepted verbatim.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Per-request correlation data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
    client: String,
}

impl RequestContext {
    /// Creates a context with a generated request id.
    #[must_use]
    pub fn new(client: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            client: client.into(),
        }
    }

    /// Creates a context reusing an incoming `x-request-id` when it is
    /// printable and reasonably short, generating one otherwise.
    #[must_use]
    pub fn from_incoming(request_id: Option<&str>, client: impl Into<String>) -> Self {
        match request_id.map(str::trim).filter(|id| is_acceptable_id(id)) {
            Some(id) => Self {
                request_id: id.to_string(),
                client: client.into(),
            },
            None => Self::new(client),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the client key used for rate limiting.
    #[must_use]
    pub fn client(&self) -> &str {
        &self.client
    }
}

fn is_acceptable_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.chars().all(|c| c.is_ascii_graphic())
}

tokio::task_local! {
    static TASK_CONTEXT: RequestContext;
}

/// Scopes a request context across an async future.
pub async fn scope_request_context<F, T>(context: RequestContext, fut: F) -> T
where
    F: Future<Output = T>,
{
    TASK_CONTEXT.scope(context, fut).await
}

/// Returns the current request id, if inside a scoped request.
#[must_use]
pub fn current_request_id() -> Option<String> {
    TASK_CONTEXT
        .try_with(|ctx| ctx.request_id.clone())
        .ok()
}
