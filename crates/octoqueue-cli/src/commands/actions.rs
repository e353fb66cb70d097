//! GitHub Actions commands: `workflows`, `runs`, `trigger`, `cancel`, `rerun`, `logs`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use octoqueue_github::TriggerWorkflow;
use serde::Serialize;

use crate::commands::utils::{self, RepoSlug};
use crate::config::Config;
use crate::output;

/// JSON output for commands that only report an action.
#[derive(Debug, Serialize)]
struct ActionOutput<'a> {
    repository: String,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow: Option<&'a str>,
}

/// Run the workflows command.
pub fn run_workflows(config: &Config, json: bool, slug: &RepoSlug) -> Result<()> {
    let workflows = utils::with_client(config, !json, |client| async move {
        Ok(client.list_workflows(&slug.owner, &slug.name).await?)
    })?;

    if json {
        return output::json(&workflows);
    }
    for workflow in &workflows {
        let state = if workflow.state == "active" {
            workflow.state.green().to_string()
        } else {
            workflow.state.dimmed().to_string()
        };
        output::essential(&format!(
            "{:<10} {:<30} {} {state}",
            workflow.id, workflow.name, workflow.path
        ));
    }
    Ok(())
}

/// Run the runs command.
pub fn run_runs(config: &Config, json: bool, slug: &RepoSlug, limit: usize) -> Result<()> {
    let mut runs = utils::with_client(config, !json, |client| async move {
        Ok(client.list_workflow_runs(&slug.owner, &slug.name).await?)
    })?;
    runs.truncate(limit);

    if json {
        return output::json(&runs);
    }
    if runs.is_empty() {
        output::info(&format!("No workflow runs in {slug}"));
        return Ok(());
    }
    for run in &runs {
        output::essential(&format!(
            "{} {:<12} {:<24} {:<16} {}",
            output::run_indicator(run),
            run.id,
            run.name.as_deref().unwrap_or("-"),
            run.head_branch.as_deref().unwrap_or("-"),
            run.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
        ));
    }
    Ok(())
}

/// Run the trigger command.
pub fn run_trigger(
    config: &Config,
    json: bool,
    slug: &RepoSlug,
    workflow: &str,
    git_ref: &str,
    inputs: &[(String, String)],
) -> Result<()> {
    let trigger = TriggerWorkflow {
        git_ref: git_ref.to_string(),
        inputs: inputs.iter().cloned().collect::<BTreeMap<_, _>>(),
    };

    utils::with_client(config, !json, |client| async move {
        client
            .trigger_workflow(&slug.owner, &slug.name, workflow, &trigger)
            .await
            .with_context(|| format!("Failed to trigger {workflow}"))
    })?;

    if json {
        return output::json(&ActionOutput {
            repository: slug.to_string(),
            action: "triggered",
            run_id: None,
            workflow: Some(workflow),
        });
    }
    output::success(&format!("Triggered {workflow} on {git_ref} in {slug}"));
    Ok(())
}

/// Run the cancel command.
pub fn run_cancel(config: &Config, json: bool, slug: &RepoSlug, run_id: u64) -> Result<()> {
    utils::with_client(config, !json, |client| async move {
        Ok(client
            .cancel_workflow_run(&slug.owner, &slug.name, run_id)
            .await?)
    })?;

    if json {
        return output::json(&ActionOutput {
            repository: slug.to_string(),
            action: "cancelled",
            run_id: Some(run_id),
            workflow: None,
        });
    }
    output::success(&format!("Requested cancellation of run {run_id}"));
    Ok(())
}

/// Run the rerun command.
pub fn run_rerun(config: &Config, json: bool, slug: &RepoSlug, run_id: u64) -> Result<()> {
    utils::with_client(config, !json, |client| async move {
        Ok(client
            .rerun_workflow_run(&slug.owner, &slug.name, run_id)
            .await?)
    })?;

    if json {
        return output::json(&ActionOutput {
            repository: slug.to_string(),
            action: "rerun",
            run_id: Some(run_id),
            workflow: None,
        });
    }
    output::success(&format!("Re-running run {run_id}"));
    Ok(())
}

/// Run the logs command.
pub fn run_logs(
    config: &Config,
    json: bool,
    slug: &RepoSlug,
    run_id: u64,
    output_path: &Path,
) -> Result<()> {
    let archive = utils::with_client(config, !json, |client| async move {
        Ok(client
            .get_workflow_run_logs(&slug.owner, &slug.name, run_id)
            .await?)
    })?;

    std::fs::write(output_path, &archive)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if json {
        return output::json(&serde_json::json!({
            "run_id": run_id,
            "path": output_path,
            "bytes": archive.len(),
        }));
    }
    output::success(&format!(
        "Saved logs of run {run_id} to {} ({} bytes)",
        output_path.display(),
        archive.len()
    ));
    Ok(())
}
