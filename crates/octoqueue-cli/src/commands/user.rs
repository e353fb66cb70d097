//! `octoqueue user` command - Show the authenticated user.

use anyhow::Result;

use crate::commands::utils;
use crate::config::Config;
use crate::output;

/// Run the user command.
pub fn run(config: &Config, json: bool) -> Result<()> {
    let user = utils::with_client(config, !json, |client| async move {
        Ok(client.get_authenticated_user().await?)
    })?;

    if json {
        return output::json(&user);
    }

    output::success(&format!("Logged in as {}", user.login));
    if let Some(name) = &user.name {
        output::detail(&format!("  Name:  {name}"));
    }
    if let Some(email) = &user.email {
        output::detail(&format!("  Email: {email}"));
    }
    if let Some(url) = &user.html_url {
        output::detail(&format!("  URL:   {url}"));
    }
    Ok(())
}
