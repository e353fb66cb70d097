//! `octoqueue repos` and `octoqueue branches` commands.

use anyhow::Result;
use colored::Colorize;

use crate::commands::utils::{self, RepoSlug};
use crate::config::Config;
use crate::output;

/// Run the repos command.
pub fn run(config: &Config, json: bool, repo: Option<&RepoSlug>) -> Result<()> {
    let Some(slug) = repo else {
        return list(config, json);
    };

    let repo = utils::with_client(config, !json, |client| async move {
        Ok(client.get_repository(&slug.owner, &slug.name).await?)
    })?;

    if json {
        return output::json(&repo);
    }
    let visibility = if repo.private { "private" } else { "public" };
    output::success(&format!("{} ({visibility})", repo.full_name));
    if let Some(description) = &repo.description {
        output::detail(&format!("  {description}"));
    }
    if let Some(branch) = &repo.default_branch {
        output::detail(&format!("  Default branch: {branch}"));
    }
    output::detail(&format!("  {}", repo.html_url));
    Ok(())
}

fn list(config: &Config, json: bool) -> Result<()> {
    let repos = utils::with_client(config, !json, |client| async move {
        Ok(client.list_repositories().await?)
    })?;

    if json {
        return output::json(&repos);
    }
    for repo in &repos {
        let name = if repo.private {
            format!("{} {}", repo.full_name, "(private)".dimmed())
        } else {
            repo.full_name.clone()
        };
        output::essential(&name);
    }
    Ok(())
}

/// Run the branches command.
pub fn run_branches(config: &Config, json: bool, slug: &RepoSlug) -> Result<()> {
    let branches = utils::with_client(config, !json, |client| async move {
        Ok(client.list_branches(&slug.owner, &slug.name).await?)
    })?;

    if json {
        return output::json(&branches);
    }
    for branch in &branches {
        let sha = branch.commit.sha.get(..7).unwrap_or(&branch.commit.sha);
        let marker = if branch.protected {
            " (protected)".yellow().to_string()
        } else {
            String::new()
        };
        output::essential(&format!("{} {}{marker}", sha.dimmed(), branch.name));
    }
    Ok(())
}
