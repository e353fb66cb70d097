//! `octoqueue orgs` command - List organizations, show one, or list its members.

use anyhow::Result;

use crate::commands::utils;
use crate::config::Config;
use crate::output;

/// Run the orgs command.
pub fn run(config: &Config, json: bool, org: Option<&str>, members: bool) -> Result<()> {
    match (org, members) {
        (Some(org), true) => list_members(config, json, org),
        (Some(org), false) => show(config, json, org),
        (None, _) => list(config, json),
    }
}

fn list(config: &Config, json: bool) -> Result<()> {
    let orgs = utils::with_client(config, !json, |client| async move {
        Ok(client.list_organizations().await?)
    })?;

    if json {
        return output::json(&orgs);
    }
    if orgs.is_empty() {
        output::info("You are not a member of any organization");
        return Ok(());
    }
    for org in &orgs {
        match &org.description {
            Some(description) if !description.is_empty() => {
                output::essential(&format!("{:<24} {description}", org.login));
            }
            _ => output::essential(&org.login),
        }
    }
    Ok(())
}

fn show(config: &Config, json: bool, org: &str) -> Result<()> {
    let org = utils::with_client(config, !json, |client| async move {
        Ok(client.get_organization(org).await?)
    })?;

    if json {
        return output::json(&org);
    }
    output::success(org.name.as_deref().unwrap_or(&org.login));
    output::detail(&format!("  Login: {}", org.login));
    if let Some(description) = &org.description {
        output::detail(&format!("  About: {description}"));
    }
    if let Some(url) = &org.html_url {
        output::detail(&format!("  URL:   {url}"));
    }
    Ok(())
}

fn list_members(config: &Config, json: bool, org: &str) -> Result<()> {
    let members = utils::with_client(config, !json, |client| async move {
        Ok(client.list_organization_members(org).await?)
    })?;

    if json {
        return output::json(&members);
    }
    output::info(&format!("{} members of {org}", members.len()));
    for member in &members {
        output::essential(&member.login);
    }
    Ok(())
}
