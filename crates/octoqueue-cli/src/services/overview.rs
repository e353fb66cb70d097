//! Repository overview service.
//!
//! Fetches a repository's metadata, branches, workflows and recent runs
//! concurrently. All four calls go through the same client queue, so they
//! share one quota window and are dispatched one at a time.

use anyhow::{Context, Result};
use octoqueue_github::{Branch, GitHubApi, Repository, Workflow, WorkflowRun};
use serde::Serialize;

/// A workflow with its most recent run, if it has one.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    pub workflow: Workflow,
    pub latest_run: Option<WorkflowRun>,
}

impl WorkflowSummary {
    /// Whether the latest run completed with a failing conclusion.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.latest_run.as_ref().is_some_and(|run| {
            matches!(
                run.conclusion.as_deref(),
                Some("failure" | "timed_out" | "startup_failure")
            )
        })
    }
}

/// Everything `octoqueue overview` shows.
#[derive(Debug, Clone, Serialize)]
pub struct RepoOverview {
    pub repository: Repository,
    pub branches: Vec<Branch>,
    pub workflows: Vec<WorkflowSummary>,
}

impl RepoOverview {
    /// Workflows whose latest run failed.
    pub fn failing(&self) -> impl Iterator<Item = &WorkflowSummary> {
        self.workflows.iter().filter(|w| w.is_failing())
    }
}

/// Service for repository overviews with trait-based dependencies.
pub struct OverviewService<'a, H: GitHubApi> {
    client: &'a H,
    owner: String,
    repo_name: String,
}

#[allow(clippy::future_not_send)]
impl<'a, H: GitHubApi> OverviewService<'a, H> {
    /// Create a new overview service.
    #[must_use]
    pub const fn new(client: &'a H, owner: String, repo_name: String) -> Self {
        Self {
            client,
            owner,
            repo_name,
        }
    }

    /// Fetch the overview.
    pub async fn fetch(&self) -> Result<RepoOverview> {
        let (owner, repo) = (self.owner.as_str(), self.repo_name.as_str());

        let (repository, branches, workflows, runs) = tokio::try_join!(
            self.client.get_repository(owner, repo),
            self.client.list_branches(owner, repo),
            self.client.list_workflows(owner, repo),
            self.client.list_workflow_runs(owner, repo),
        )
        .with_context(|| format!("Failed to load {owner}/{repo}"))?;

        Ok(RepoOverview {
            repository,
            branches,
            workflows: Self::latest_runs(workflows, &runs),
        })
    }

    /// Pair each workflow with its newest run.
    ///
    /// `runs` may be in any order; the newest is picked by creation time.
    #[must_use]
    pub fn latest_runs(workflows: Vec<Workflow>, runs: &[WorkflowRun]) -> Vec<WorkflowSummary> {
        workflows
            .into_iter()
            .map(|workflow| {
                let latest_run = runs
                    .iter()
                    .filter(|run| run.workflow_id == workflow.id)
                    .max_by_key(|run| run.created_at)
                    .cloned();
                WorkflowSummary {
                    workflow,
                    latest_run,
                }
            })
            .collect()
    }
}
