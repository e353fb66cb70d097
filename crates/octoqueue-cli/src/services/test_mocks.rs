//! Mock implementations for testing services.
//!
//! `MockGitHubClient` implements `GitHubApi` from canned data so services can
//! be tested without a network.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use octoqueue_github::{
    Branch, BranchCommit, CreateWebhook, Error, GitHubApi, Organization, QuotaState,
    RateLimitOverview, Repository, RepositoryOwner, Result, RunStatus, TriggerWorkflow, User,
    Webhook, Workflow, WorkflowRun,
};

/// A workflow with the given ID and name.
pub fn workflow(id: u64, name: &str) -> Workflow {
    Workflow {
        id,
        name: name.to_string(),
        path: format!(".github/workflows/{}.yml", name.to_lowercase()),
        state: "active".into(),
    }
}

/// A completed run of `workflow_id`, created `created_secs` after the epoch.
pub fn run(id: u64, workflow_id: u64, conclusion: &str, created_secs: i64) -> WorkflowRun {
    WorkflowRun {
        id,
        name: Some(format!("run {id}")),
        head_branch: Some("main".into()),
        head_sha: format!("{id:040x}"),
        event: "push".into(),
        status: Some(RunStatus::Completed),
        conclusion: Some(conclusion.to_string()),
        workflow_id,
        html_url: format!("https://github.com/octo/hello-world/actions/runs/{id}"),
        created_at: DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(created_secs),
    }
}

/// Mock implementation of `GitHubApi` for testing.
pub struct MockGitHubClient {
    workflows: Vec<Workflow>,
    runs: Vec<WorkflowRun>,
    repository_missing: bool,
    calls: AtomicUsize,
}

impl Default for MockGitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitHubClient {
    pub const fn new() -> Self {
        Self {
            workflows: Vec::new(),
            runs: Vec::new(),
            repository_missing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_workflows(mut self, workflows: Vec<Workflow>) -> Self {
        self.workflows = workflows;
        self
    }

    pub fn with_runs(mut self, runs: Vec<WorkflowRun>) -> Self {
        self.runs = runs;
        self
    }

    pub const fn with_missing_repository(mut self) -> Self {
        self.repository_missing = true;
        self
    }

    /// Number of API calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl GitHubApi for MockGitHubClient {
    async fn get_authenticated_user(&self) -> Result<User> {
        self.record();
        Ok(User {
            id: 1,
            login: "octocat".into(),
            name: None,
            email: None,
            avatar_url: None,
            html_url: None,
        })
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.record();
        Ok(Vec::new())
    }

    async fn get_organization(&self, org: &str) -> Result<Organization> {
        self.record();
        Ok(Organization {
            id: 1,
            login: org.to_string(),
            name: None,
            description: None,
            html_url: None,
        })
    }

    async fn list_organization_members(&self, _org: &str) -> Result<Vec<User>> {
        self.record();
        Ok(Vec::new())
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.record();
        Ok(Vec::new())
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.record();
        if self.repository_missing {
            return Err(Error::NotFound {
                message: "Not Found".into(),
                quota: QuotaState::default(),
            });
        }
        Ok(Repository {
            id: 1,
            name: repo.to_string(),
            full_name: format!("{owner}/{repo}"),
            owner: RepositoryOwner {
                login: owner.to_string(),
            },
            private: false,
            description: None,
            html_url: format!("https://github.com/{owner}/{repo}"),
            default_branch: Some("main".into()),
        })
    }

    async fn list_branches(&self, _owner: &str, _repo: &str) -> Result<Vec<Branch>> {
        self.record();
        Ok(vec![Branch {
            name: "main".into(),
            commit: BranchCommit {
                sha: "abc1234".into(),
            },
            protected: true,
        }])
    }

    async fn list_workflows(&self, _owner: &str, _repo: &str) -> Result<Vec<Workflow>> {
        self.record();
        Ok(self.workflows.clone())
    }

    async fn list_workflow_runs(&self, _owner: &str, _repo: &str) -> Result<Vec<WorkflowRun>> {
        self.record();
        Ok(self.runs.clone())
    }

    async fn trigger_workflow(
        &self,
        _owner: &str,
        _repo: &str,
        _workflow: &str,
        _trigger: &TriggerWorkflow,
    ) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn cancel_workflow_run(&self, _owner: &str, _repo: &str, _run_id: u64) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn rerun_workflow_run(&self, _owner: &str, _repo: &str, _run_id: u64) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn get_workflow_run_logs(
        &self,
        _owner: &str,
        _repo: &str,
        _run_id: u64,
    ) -> Result<Vec<u8>> {
        self.record();
        Ok(Vec::new())
    }

    async fn create_webhook(
        &self,
        _owner: &str,
        _repo: &str,
        hook: &CreateWebhook,
    ) -> Result<Webhook> {
        self.record();
        Ok(Webhook {
            id: 1,
            active: true,
            events: hook.events.clone(),
            config: octoqueue_github::WebhookConfig {
                url: Some(hook.url.clone()),
                content_type: Some("json".into()),
            },
        })
    }

    async fn delete_webhook(&self, _owner: &str, _repo: &str, _hook_id: u64) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn get_rate_limit(&self) -> Result<RateLimitOverview> {
        self.record();
        Ok(RateLimitOverview {
            resources: std::collections::BTreeMap::new(),
        })
    }
}
