//! OAuth 2.0 authorization-code flow against GitHub.
//!
//! Handles:
//! - Authorization URL building
//! - Authorization code exchange
//! - Token refresh (GitHub Apps with expiring user tokens)
//!
//! Token endpoint calls go straight to the OAuth host; they do not pass
//! through the request scheduler and do not touch the API quota.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::RngCore;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// GitHub's authorization endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub's token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth application settings.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Application client ID.
    pub client_id: String,

    /// Application client secret.
    pub client_secret: SecretString,

    /// Callback URL registered with the application.
    pub redirect_uri: String,

    /// Requested scopes.
    pub scopes: BTreeSet<String>,

    /// Whether unauthenticated users may sign up during the flow.
    pub allow_signup: bool,

    /// Authorization endpoint.
    pub authorize_url: String,

    /// Token endpoint.
    pub token_url: String,
}

impl OAuthConfig {
    /// Settings for GitHub's public endpoints with no scopes.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
            scopes: BTreeSet::new(),
            allow_signup: true,
            authorize_url: DEFAULT_AUTHORIZE_URL.into(),
            token_url: DEFAULT_TOKEN_URL.into(),
        }
    }

    /// Scopes joined by single spaces.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Tokens issued by the token endpoint.
///
/// `Debug` output shows `[REDACTED]` for both tokens.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: SecretString,

    /// Token type, normally `bearer`.
    pub token_type: String,

    /// Granted scopes, comma-separated as GitHub reports them.
    pub scope: String,

    /// Refresh token, only for expiring user tokens.
    pub refresh_token: Option<SecretString>,

    /// Access token lifetime in seconds.
    pub expires_in: Option<u64>,

    /// Refresh token lifetime in seconds.
    pub refresh_token_expires_in: Option<u64>,
}

/// Token endpoint body. GitHub answers 200 even on failure, with `error` set.
#[derive(Deserialize)]
struct ApiTokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    scope: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    refresh_token_expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl ApiTokenResponse {
    fn into_token_response(self) -> Result<TokenResponse> {
        if let Some(error) = self.error {
            return Err(Error::OAuth {
                error,
                description: self.error_description,
            });
        }

        let access_token = self.access_token.ok_or_else(|| Error::OAuth {
            error: "invalid_response".into(),
            description: Some("token endpoint returned no access_token".into()),
        })?;

        Ok(TokenResponse {
            access_token: SecretString::from(access_token),
            token_type: self.token_type,
            scope: self.scope,
            refresh_token: self.refresh_token.map(SecretString::from),
            expires_in: self.expires_in,
            refresh_token_expires_in: self.refresh_token_expires_in,
        })
    }
}

#[derive(Serialize)]
struct CodeExchange<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Serialize)]
struct RefreshExchange<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    refresh_token: &'a str,
}

/// OAuth authorization-code flow for one application.
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    config: OAuthConfig,
    client: Client,
}

impl OAuthFlow {
    /// Create a flow for `config`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(TOKEN_TIMEOUT)
            .user_agent(concat!("octoqueue/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    /// Application settings.
    #[must_use]
    pub const fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the URL to send the user's browser to.
    ///
    /// `state` is passed through verbatim; checking it on the callback is
    /// the caller's job.
    ///
    /// # Errors
    /// Returns error if the configured authorization URL is not a valid URL.
    pub fn authorization_url(&self, state: &str) -> Result<Url> {
        let allow_signup = if self.config.allow_signup {
            "true"
        } else {
            "false"
        };
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            [
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope_string().as_str()),
                ("state", state),
                ("allow_signup", allow_signup),
            ],
        )?;
        Ok(url)
    }

    /// Exchange the `code` from the callback for tokens.
    ///
    /// # Errors
    /// Returns [`Error::OAuth`] if GitHub rejects the code and
    /// [`Error::OAuthTransport`] if the token endpoint cannot be reached.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        debug!(client_id = %self.config.client_id, "exchanging authorization code");
        let body = CodeExchange {
            client_id: &self.config.client_id,
            client_secret: self.config.client_secret.expose_secret(),
            code,
            redirect_uri: &self.config.redirect_uri,
        };
        self.request_token(&body).await
    }

    /// Trade a refresh token for a new token pair.
    ///
    /// # Errors
    /// Same as [`OAuthFlow::exchange_code`].
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<TokenResponse> {
        debug!(client_id = %self.config.client_id, "refreshing user token");
        let body = RefreshExchange {
            client_id: &self.config.client_id,
            client_secret: self.config.client_secret.expose_secret(),
            grant_type: "refresh_token",
            refresh_token: refresh_token.expose_secret(),
        };
        self.request_token(&body).await
    }

    async fn request_token<B: Serialize + Sync>(&self, body: &B) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.config.token_url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(body)
            .send()
            .await
            .map_err(Error::OAuthTransport)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(Error::OAuthTransport)?;

        match serde_json::from_slice::<ApiTokenResponse>(&bytes) {
            Ok(parsed) => parsed.into_token_response().inspect_err(|err| {
                warn!(%status, error = %err, "token endpoint rejected the request");
            }),
            Err(_) if !status.is_success() => Err(Error::OAuth {
                error: format!("http_{}", status.as_u16()),
                description: Some(String::from_utf8_lossy(&bytes).into_owned()),
            }),
            Err(err) => Err(Error::Decode(err)),
        }
    }
}

/// Generate a random `state` value for the authorization URL.
///
/// 32 random bytes, hex-encoded.
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
