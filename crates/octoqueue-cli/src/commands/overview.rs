//! `octoqueue overview` command - Summarize a repository.

use anyhow::Result;
use colored::Colorize;

use crate::commands::utils::{self, RepoSlug};
use crate::config::Config;
use crate::output;
use crate::services::{OverviewService, RepoOverview};

/// Run the overview command.
pub fn run(config: &Config, json: bool, slug: &RepoSlug) -> Result<()> {
    let overview = utils::with_client(config, !json, |client| async move {
        let service = OverviewService::new(&*client, slug.owner.clone(), slug.name.clone());
        service.fetch().await
    })?;

    if json {
        return output::json(&overview);
    }
    print_overview(&overview);
    Ok(())
}

fn print_overview(overview: &RepoOverview) {
    let repo = &overview.repository;
    output::success(&repo.full_name);
    if let Some(description) = &repo.description {
        output::detail(&format!("  {description}"));
    }
    output::detail(&format!(
        "  {} branches, {} workflows",
        overview.branches.len(),
        overview.workflows.len()
    ));
    output::hr();

    for summary in &overview.workflows {
        let latest = summary.latest_run.as_ref().map_or_else(
            || format!("{} {}", "○".dimmed(), "no runs".dimmed()),
            |run| {
                format!(
                    "{} {} on {}",
                    output::run_indicator(run),
                    run.conclusion.as_deref().unwrap_or("running"),
                    run.head_branch.as_deref().unwrap_or("-")
                )
            },
        );
        output::essential(&format!("{:<30} {latest}", summary.workflow.name));
    }

    let failing = overview.failing().count();
    if failing > 0 {
        output::warn(&format!("{failing} workflow(s) failing"));
    }
}
