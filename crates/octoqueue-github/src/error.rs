//! Error types for octoqueue-github.

use crate::quota::QuotaState;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub API operations.
///
/// Errors produced by a dispatched request carry the quota snapshot observed
/// right after the response, see [`Error::quota`]. Rate-limit rejections never
/// appear here: the scheduler absorbs them and retries the request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The token was rejected (401).
    #[error("GitHub authentication failed: {message}")]
    Unauthorized { message: String, quota: QuotaState },

    /// The token lacks access to the resource (403 without rate limiting).
    #[error("access forbidden: {message}")]
    Forbidden { message: String, quota: QuotaState },

    /// Resource not found or not visible to the token (404).
    #[error("not found: {message}")]
    NotFound { message: String, quota: QuotaState },

    /// The request was understood but rejected (422).
    #[error("validation failed: {message}{}", format_detail(.detail))]
    ValidationFailed {
        message: String,
        /// Server-provided detail from the `errors` array, if any.
        detail: Option<String>,
        quota: QuotaState,
    },

    /// Any other unexpected status.
    #[error("GitHub API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        quota: QuotaState,
    },

    /// Network failure, timeout, or a body that could not be read.
    #[error("network error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
        quota: QuotaState,
    },

    /// A successful response did not have the expected shape.
    #[error("failed to parse GitHub response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Webhook payload is not valid JSON.
    #[error("invalid webhook payload: {0}")]
    Payload(#[source] serde_json::Error),

    /// Webhook signature did not match the payload.
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// The OAuth provider rejected the exchange.
    #[error("OAuth error: {error}{}", format_detail(.description))]
    OAuth {
        error: String,
        description: Option<String>,
    },

    /// The OAuth token endpoint could not be reached.
    #[error("OAuth request failed: {0}")]
    OAuthTransport(#[source] reqwest::Error),

    /// The request was cancelled before it was dispatched.
    #[error("request cancelled before dispatch")]
    Cancelled,

    /// The scheduler shut down before the request was dispatched.
    #[error("client shut down before the request was dispatched")]
    Shutdown,

    /// The scheduler no longer accepts requests.
    #[error("client is closed")]
    SchedulerClosed,

    /// The client was constructed outside of a Tokio runtime.
    #[error("octoqueue requires a Tokio runtime")]
    NoRuntime,

    /// Token not found.
    #[error("no GitHub token found - run `gh auth login` or set GITHUB_TOKEN")]
    NoToken,

    /// HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// A configured value cannot be used in a request.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configured URL is not valid.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error (e.g., reading gh CLI token).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Quota snapshot attached to errors from dispatched requests.
    #[must_use]
    pub const fn quota(&self) -> Option<&QuotaState> {
        match self {
            Self::Unauthorized { quota, .. }
            | Self::Forbidden { quota, .. }
            | Self::NotFound { quota, .. }
            | Self::ValidationFailed { quota, .. }
            | Self::Api { quota, .. }
            | Self::Transport { quota, .. } => Some(quota),
            _ => None,
        }
    }

    /// HTTP status for errors that came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::ValidationFailed { .. } => Some(422),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn format_detail(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}
