//! Configuration management for octoqueue.
//!
//! Secrets are never read from the config file: the token comes from
//! `GITHUB_TOKEN`/`GH_TOKEN` or the gh CLI, the OAuth client secret from
//! `GITHUB_CLIENT_SECRET`, the webhook secret from `GITHUB_WEBHOOK_SECRET`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use octoqueue_github::oauth::{DEFAULT_AUTHORIZE_URL, DEFAULT_TOKEN_URL};
use octoqueue_github::{ClientConfig, OAuthConfig, SecretString};
use serde::{Deserialize, Serialize};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "octoqueue.toml";

/// octoqueue configuration loaded from `octoqueue.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API client settings.
    #[serde(default)]
    pub api: ClientConfig,

    /// OAuth application settings.
    #[serde(default)]
    pub oauth: OAuthSettings,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// OAuth application settings (everything except the client secret).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    /// Application client ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Registered callback URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Requested scopes.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Whether users may sign up during authorization.
    #[serde(default = "default_allow_signup")]
    pub allow_signup: bool,

    /// Authorization endpoint (change for GitHub Enterprise).
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// Token endpoint (change for GitHub Enterprise).
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            redirect_uri: None,
            scopes: Vec::new(),
            allow_signup: default_allow_signup(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
        }
    }
}

impl OAuthSettings {
    /// Build the library configuration with `client_secret`.
    ///
    /// # Errors
    /// Returns error if `client_id` or `redirect_uri` is not configured.
    pub fn to_oauth_config(&self, client_secret: SecretString) -> Result<OAuthConfig> {
        let client_id = self
            .client_id
            .as_deref()
            .context("oauth.client_id is not set in the config file")?;
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .context("oauth.redirect_uri is not set in the config file")?;

        let mut config = OAuthConfig::new(client_id, client_secret, redirect_uri);
        config.scopes = self.scopes.iter().cloned().collect();
        config.allow_signup = self.allow_signup;
        config.authorize_url.clone_from(&self.authorize_url);
        config.token_url.clone_from(&self.token_url);
        Ok(config)
    }
}

const fn default_allow_signup() -> bool {
    true
}

fn default_authorize_url() -> String {
    DEFAULT_AUTHORIZE_URL.into()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.into()
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set (e.g. `warn`, `octoqueue_github=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use octoqueue_github::ExposeSecret;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.api_url, "https://api.github.com");
        assert_eq!(config.api.reset_margin_secs, 1);
        assert_eq!(config.oauth.token_url, DEFAULT_TOKEN_URL);
        assert!(config.oauth.allow_signup);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_config_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("octoqueue.toml");

        let mut config = Config::default();
        config.api.api_url = "https://github.example.com/api/v3".into();
        config.api.reset_margin_secs = 3;
        config.oauth.client_id = Some("Iv1.abc".into());
        config.oauth.scopes = vec!["repo".into()];
        config.log.level = "debug".into();

        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.api.api_url, "https://github.example.com/api/v3");
        assert_eq!(loaded.api.reset_margin_secs, 3);
        assert_eq!(loaded.oauth.client_id.as_deref(), Some("Iv1.abc"));
        assert_eq!(loaded.oauth.scopes, ["repo"]);
        assert_eq!(loaded.log.level, "debug");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("octoqueue.toml");
        fs::write(&path, "[api]\ntimeout_secs = 5\n").unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.api_version, "2022-11-28");
        assert!(config.oauth.client_id.is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("octoqueue.toml");
        fs::write(&path, "[api\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_missing_config_returns_default() {
        let config = Config::load("/nonexistent/path/octoqueue.toml").unwrap();
        assert_eq!(config.api.api_url, "https://api.github.com");
    }

    #[test]
    fn test_oauth_settings_require_client_id() {
        let settings = OAuthSettings::default();
        let err = settings
            .to_oauth_config(SecretString::from("secret"))
            .unwrap_err();
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn test_oauth_settings_to_config() {
        let settings = OAuthSettings {
            client_id: Some("Iv1.abc".into()),
            redirect_uri: Some("http://localhost:8080/callback".into()),
            scopes: vec!["repo".into(), "read:org".into(), "repo".into()],
            ..OAuthSettings::default()
        };

        let config = settings
            .to_oauth_config(SecretString::from("secret"))
            .unwrap();

        assert_eq!(config.client_id, "Iv1.abc");
        assert_eq!(config.scope_string(), "read:org repo");
        assert_eq!(config.client_secret.expose_secret(), "secret");
    }
}
