//! Client settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for a [`GitHubClient`](crate::GitHubClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST API base URL (change for GitHub Enterprise).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Value of the `User-Agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Value of the `X-GitHub-Api-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra seconds to wait past the reported reset time before sending
    /// again, to absorb clock skew between us and GitHub.
    #[serde(default = "default_reset_margin_secs")]
    pub reset_margin_secs: u64,
}

impl ClientConfig {
    /// Default GitHub API URL.
    pub const DEFAULT_API_URL: &'static str = "https://api.github.com";

    /// API version sent with every request.
    pub const DEFAULT_API_VERSION: &'static str = "2022-11-28";

    /// Settings pointing at a different API URL.
    #[must_use]
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reset margin as a [`Duration`].
    #[must_use]
    pub const fn reset_margin(&self) -> Duration {
        Duration::from_secs(self.reset_margin_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            reset_margin_secs: default_reset_margin_secs(),
        }
    }
}

fn default_api_url() -> String {
    ClientConfig::DEFAULT_API_URL.into()
}

fn default_user_agent() -> String {
    concat!("octoqueue/", env!("CARGO_PKG_VERSION")).into()
}

fn default_api_version() -> String {
    ClientConfig::DEFAULT_API_VERSION.into()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_reset_margin_secs() -> u64 {
    1
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.api_version, "2022-11-28");
        assert!(config.user_agent.starts_with("octoqueue/"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.reset_margin(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_url": "https://ghe.example.com/api/v3"}"#).unwrap();

        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.reset_margin_secs, 1);
    }
}
