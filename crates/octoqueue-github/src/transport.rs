//! Authenticated HTTP dispatch and response classification.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::quota::QuotaState;
use crate::request::{ApiResponse, RequestDescriptor};

/// Wait applied to a secondary rate limit that names no retry time.
const SECONDARY_LIMIT_FALLBACK: Duration = Duration::from_secs(60);

/// Longest wait taken from a single rejection. Primary windows last an hour.
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60 * 60);

/// Outcome of sending one request.
#[derive(Debug)]
pub enum Dispatch {
    /// The request finished; the result goes back to the caller.
    Settled(Result<ApiResponse>),

    /// GitHub refused the request because of rate limiting. The request
    /// should be sent again once `retry_after` has elapsed.
    RateLimited { retry_after: Duration },
}

/// Sends a single request and reports how it went.
///
/// Implementations update `quota` from whatever rate-limit headers the
/// response carries, success or failure.
pub trait Transport: Send + Sync + 'static {
    /// Send `request`, using `now` for any reset-time arithmetic.
    fn send(
        &self,
        request: &RequestDescriptor,
        quota: &mut QuotaState,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Dispatch> + Send;
}

/// [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    /// Token stored as `SecretString` for automatic zeroization on drop.
    token: SecretString,
}

impl HttpTransport {
    /// Create a transport for `config.api_url` using `token`.
    ///
    /// # Errors
    /// Returns error if the configured headers are invalid or the HTTP client
    /// cannot be built.
    pub fn new(token: SecretString, config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, header_value("user agent", &config.user_agent)?);
        headers.insert(
            "X-GitHub-Api-Version",
            header_value("API version", &config.api_version)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn execute(
        &self,
        request: &RequestDescriptor,
        quota: &mut QuotaState,
    ) -> std::result::Result<ApiResponse, reqwest::Error> {
        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        quota.apply_headers(response.headers());

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ApiResponse::new(status, headers, body.to_vec()))
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &RequestDescriptor,
        quota: &mut QuotaState,
        now: DateTime<Utc>,
    ) -> Dispatch {
        match self.execute(request, quota).await {
            Ok(response) => {
                debug!(
                    method = %request.method(),
                    path = request.path(),
                    status = response.status().as_u16(),
                    remaining = quota.remaining,
                    "GitHub responded"
                );
                classify(response, quota, now)
            }
            Err(source) => Dispatch::Settled(Err(Error::Transport {
                source,
                quota: quota.clone(),
            })),
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

/// Classify a fully-read response.
///
/// `quota` must already reflect the response headers.
#[must_use]
pub fn classify(response: ApiResponse, quota: &QuotaState, now: DateTime<Utc>) -> Dispatch {
    let status = response.status();
    if status.is_success() {
        return Dispatch::Settled(Ok(response));
    }

    if let Some(retry_after) = rate_limit_delay(&response, quota, now) {
        return Dispatch::RateLimited { retry_after };
    }

    let ErrorBody { message, detail } = ErrorBody::parse(response.bytes(), status);
    let quota = quota.clone();
    let error = match status.as_u16() {
        401 => Error::Unauthorized { message, quota },
        403 => Error::Forbidden { message, quota },
        404 => Error::NotFound { message, quota },
        422 => Error::ValidationFailed {
            message,
            detail,
            quota,
        },
        status => Error::Api {
            status,
            message,
            quota,
        },
    };
    Dispatch::Settled(Err(error))
}

/// How long to hold off if the response is a rate-limit rejection.
fn rate_limit_delay(
    response: &ApiResponse,
    quota: &QuotaState,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let headers = response.headers();
    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .is_some_and(|v| v == "0");

    let delay = match response.status().as_u16() {
        403 | 429 if exhausted => {
            Some(retry_after.unwrap_or_else(|| quota.time_until_reset(now)))
        }
        // Secondary limits come as 403 or 429 with Retry-After
        403 => retry_after,
        429 => Some(retry_after.unwrap_or(SECONDARY_LIMIT_FALLBACK)),
        _ => None,
    };
    delay.map(|d| d.min(MAX_RATE_LIMIT_WAIT))
}

/// Error body returned by the REST API.
struct ErrorBody {
    message: String,
    detail: Option<String>,
}

impl ErrorBody {
    fn parse(body: &[u8], status: reqwest::StatusCode) -> Self {
        #[derive(serde::Deserialize)]
        struct Raw {
            message: Option<String>,
            #[serde(default)]
            errors: Vec<serde_json::Value>,
        }

        let Ok(raw) = serde_json::from_slice::<Raw>(body) else {
            let text = String::from_utf8_lossy(body).trim().to_string();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").into()
            } else {
                text
            };
            return Self {
                message,
                detail: None,
            };
        };

        let details: Vec<String> = raw.errors.iter().filter_map(describe_error).collect();

        Self {
            message: raw
                .message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").into()),
            detail: (!details.is_empty()).then(|| details.join("; ")),
        }
    }
}

/// Render one entry of the `errors` array.
fn describe_error(entry: &serde_json::Value) -> Option<String> {
    if let Some(text) = entry.as_str() {
        return Some(text.to_string());
    }
    if let Some(message) = entry.get("message").and_then(|m| m.as_str()) {
        return Some(message.to_string());
    }
    let field = entry.get("field").and_then(|f| f.as_str());
    let code = entry.get("code").and_then(|c| c.as_str());
    match (field, code) {
        (Some(field), Some(code)) => Some(format!("{field}: {code}")),
        (None, Some(code)) => Some(code.to_string()),
        _ => None,
    }
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidConfig(format!("{what} is not a valid header value: {value:?}")))
}
