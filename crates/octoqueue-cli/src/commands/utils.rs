use std::fmt;
use std::future::Future;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use octoqueue_github::{Auth, GitHubClient, SecretString, ShutdownMode};
use tracing::debug;

use crate::config::Config;

/// Environment variable holding the OAuth client secret.
pub const CLIENT_SECRET_ENV: &str = "GITHUB_CLIENT_SECRET";

/// Environment variable holding the webhook secret.
pub const WEBHOOK_SECRET_ENV: &str = "GITHUB_WEBHOOK_SECRET";

/// A repository given as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

/// Error for a malformed `owner/name` argument.
#[derive(Debug, thiserror::Error)]
#[error("expected a repository as owner/name, got '{0}'")]
pub struct InvalidRepoSlug(String);

impl FromStr for RepoSlug {
    type Err = InvalidRepoSlug;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.trim_end_matches(".git").to_string(),
                })
            }
            _ => Err(InvalidRepoSlug(s.to_string())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a workflow input given as `key=value`.
pub fn parse_input(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

/// Run `op` with a client on a fresh runtime.
///
/// Anything still queued when `op` returns is dispatched before returning.
pub fn with_client<T, F, Fut>(config: &Config, show_progress: bool, op: F) -> Result<T>
where
    F: FnOnce(Arc<GitHubClient>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    let spinner = show_progress.then(|| spinner("Talking to GitHub..."));

    let result = rt.block_on(async {
        let auth = Auth::auto();
        debug!(?auth, api_url = %config.api.api_url, "creating GitHub client");
        let client = Arc::new(
            GitHubClient::new(&auth, &config.api).context("Failed to create GitHub client")?,
        );
        let value = op(Arc::clone(&client)).await;

        debug!("draining request queue");
        client.shutdown(ShutdownMode::Drain).await;
        let quota = client.quota();
        debug!(
            resource = %quota.resource,
            remaining = quota.remaining,
            limit = quota.limit,
            "GitHub client shut down"
        );
        value
    });

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    result
}

/// A spinner on stderr for long-running calls.
pub fn spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Read a secret from `var`, or prompt for it.
pub fn secret_from_env_or_prompt(var: &str, prompt: &str) -> Result<SecretString> {
    if let Some(value) = std::env::var(var).ok().filter(|v| !v.is_empty()) {
        debug!(var, "secret read from environment");
        return Ok(SecretString::from(value));
    }

    let value = inquire::Password::new(prompt)
        .without_confirmation()
        .with_help_message(&format!("Set {var} to skip this prompt"))
        .prompt()
        .with_context(|| format!("{var} is not set"))?;
    Ok(SecretString::from(value))
}

/// Read a payload from `file`, or stdin when `None`.
pub fn read_payload(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read payload from stdin")?;
            Ok(buf)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_slug_parse() {
        let slug: RepoSlug = "octo/hello-world".parse().unwrap();
        assert_eq!(slug.owner, "octo");
        assert_eq!(slug.name, "hello-world");
        assert_eq!(slug.to_string(), "octo/hello-world");
    }

    #[test]
    fn test_repo_slug_strips_git_suffix() {
        let slug: RepoSlug = "octo/hello-world.git".parse().unwrap();
        assert_eq!(slug.name, "hello-world");
    }

    #[test]
    fn test_repo_slug_invalid() {
        for input in ["octo", "/repo", "octo/", "a/b/c", ""] {
            assert!(input.parse::<RepoSlug>().is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(
            parse_input("environment=staging").unwrap(),
            ("environment".to_string(), "staging".to_string())
        );
        assert_eq!(
            parse_input("flags=a=b").unwrap(),
            ("flags".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_input("empty=").unwrap().1, "");
        assert!(parse_input("novalue").is_err());
        assert!(parse_input("=x").is_err());
    }

    #[test]
    fn test_read_payload_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), b"{\"zen\":\"hi\"}").unwrap();

        let payload = read_payload(Some(temp.path())).unwrap();
        assert_eq!(payload, b"{\"zen\":\"hi\"}");
    }

    #[test]
    fn test_read_payload_missing_file() {
        let err = read_payload(Some(Path::new("/nonexistent/payload.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
