//! `octoqueue oauth` commands - Authorization URL and code exchange.

use anyhow::{Context, Result};
use octoqueue_github::oauth::generate_state;
use octoqueue_github::{ExposeSecret, OAuthFlow, SecretString};
use serde::Serialize;

use crate::commands::utils::{self, CLIENT_SECRET_ENV};
use crate::config::Config;
use crate::output;

/// JSON output for the url command.
#[derive(Debug, Serialize)]
struct UrlOutput {
    url: String,
    state: String,
}

/// JSON output for the exchange command.
#[derive(Debug, Serialize)]
struct ExchangeOutput<'a> {
    access_token: &'a str,
    token_type: &'a str,
    scope: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in: Option<u64>,
}

/// Run the oauth url command.
pub fn run_url(config: &Config, json: bool, state: Option<String>) -> Result<()> {
    // no secret in the authorization URL
    let oauth = config
        .oauth
        .to_oauth_config(SecretString::from(String::new()))?;
    let flow = OAuthFlow::new(oauth)?;

    let state = state.unwrap_or_else(generate_state);
    let url = flow.authorization_url(&state)?;

    if json {
        return output::json(&UrlOutput {
            url: url.to_string(),
            state,
        });
    }
    output::info("Open this URL in a browser to authorize the application:");
    output::essential(url.as_str());
    output::detail(&format!("State: {state}"));
    Ok(())
}

/// Run the oauth exchange command.
pub fn run_exchange(config: &Config, json: bool, code: Option<String>) -> Result<()> {
    let code = match code {
        Some(code) => code,
        None => inquire::Text::new("Authorization code:")
            .prompt()
            .context("No authorization code given")?,
    };
    let secret = utils::secret_from_env_or_prompt(CLIENT_SECRET_ENV, "Client secret:")?;
    let flow = OAuthFlow::new(config.oauth.to_oauth_config(secret)?)?;

    let rt = tokio::runtime::Runtime::new()?;
    let tokens = rt
        .block_on(flow.exchange_code(code.trim()))
        .context("Code exchange failed")?;

    if json {
        return output::json(&ExchangeOutput {
            access_token: tokens.access_token.expose_secret(),
            token_type: &tokens.token_type,
            scope: &tokens.scope,
            refresh_token: tokens.refresh_token.as_ref().map(|t| t.expose_secret()),
            expires_in: tokens.expires_in,
        });
    }
    output::success(&format!("Authorized with scopes: {}", tokens.scope));
    output::essential(tokens.access_token.expose_secret());
    if let Some(expires_in) = tokens.expires_in {
        output::detail(&format!("Expires in {expires_in}s"));
    }
    Ok(())
}
