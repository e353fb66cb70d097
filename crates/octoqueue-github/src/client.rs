//! GitHub API client.
//!
//! Every operation builds a [`RequestDescriptor`] and submits it to the
//! client's [`RequestScheduler`], so all calls made through one client share
//! a single quota window and are dispatched one at a time.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::auth::Auth;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::quota::QuotaState;
use crate::request::{ApiResponse, RequestDescriptor};
use crate::scheduler::{RequestScheduler, ShutdownMode};
use crate::traits::GitHubApi;
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    Branch, CreateWebhook, Organization, RateLimitOverview, Repository, TriggerWorkflow, User,
    Webhook, Workflow, WorkflowRun,
};

/// Page size requested by list operations.
const PER_PAGE: u32 = 100;

// === Internal API request/response types ===

#[derive(serde::Deserialize)]
struct ApiWorkflows {
    workflows: Vec<Workflow>,
}

#[derive(serde::Deserialize)]
struct ApiWorkflowRuns {
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(serde::Serialize)]
struct ApiCreateWebhook<'a> {
    name: &'static str,
    active: bool,
    events: &'a [String],
    config: ApiWebhookConfig<'a>,
}

#[derive(serde::Serialize)]
struct ApiWebhookConfig<'a> {
    url: &'a str,
    content_type: &'static str,
    secret: &'a str,
    insecure_ssl: &'static str,
}

/// Percent-encode a caller-supplied path segment, so `/`, `?` and `#` in
/// names cannot change the request path or query.
fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}

fn org_path(org: &str) -> String {
    format!("/orgs/{}", encode_segment(org))
}

fn repo_path(owner: &str, repo: &str) -> String {
    format!("/repos/{}/{}", encode_segment(owner), encode_segment(repo))
}

/// GitHub API client.
///
/// Must be created inside a Tokio runtime. Dropping the client closes its
/// queue; requests already queued are still dispatched.
#[derive(Debug)]
pub struct GitHubClient {
    scheduler: RequestScheduler,
}

impl GitHubClient {
    /// Create a new GitHub client.
    ///
    /// # Errors
    /// Returns error if authentication fails, the configuration is unusable
    /// or no Tokio runtime is running.
    pub fn new(auth: &Auth, config: &ClientConfig) -> Result<Self> {
        Self::with_clock(auth, config, Arc::new(SystemClock))
    }

    /// Create a client that reads time from `clock`.
    ///
    /// # Errors
    /// Same as [`GitHubClient::new`].
    pub fn with_clock(auth: &Auth, config: &ClientConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let token = auth.resolve()?;
        let transport = HttpTransport::new(token, config)?;
        Self::with_transport(transport, clock, config)
    }

    /// Create a client that dispatches through `transport`.
    ///
    /// # Errors
    /// Returns error if no Tokio runtime is running.
    pub fn with_transport<T: Transport>(
        transport: T,
        clock: Arc<dyn Clock>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let scheduler = RequestScheduler::spawn(transport, clock, config.reset_margin())?;
        Ok(Self { scheduler })
    }

    /// Latest known rate limit window.
    #[must_use]
    pub fn quota(&self) -> QuotaState {
        self.scheduler.quota()
    }

    /// Stop dispatching and wait for the worker to exit.
    pub async fn shutdown(&self, mode: ShutdownMode) {
        self.scheduler.shutdown(mode).await;
    }

    /// Submit a request and return the raw response.
    ///
    /// # Errors
    /// Returns the request's terminal error.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<ApiResponse> {
        self.scheduler.submit(descriptor).await
    }

    async fn get<T: DeserializeOwned>(&self, path: impl Into<String>) -> Result<T> {
        self.send(RequestDescriptor::get(path)).await?.json()
    }

    async fn post_empty(&self, path: impl Into<String>) -> Result<()> {
        self.send(RequestDescriptor::post(path)).await.map(drop)
    }

    // === User & Organizations ===

    /// Get the user the token belongs to.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_authenticated_user(&self) -> Result<User> {
        self.get("/user").await
    }

    /// List organizations of the authenticated user.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.get(format!("/user/orgs?per_page={PER_PAGE}")).await
    }

    /// Get an organization.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_organization(&self, org: &str) -> Result<Organization> {
        self.get(org_path(org)).await
    }

    /// List members of an organization.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_organization_members(&self, org: &str) -> Result<Vec<User>> {
        self.get(format!("{}/members?per_page={PER_PAGE}", org_path(org)))
            .await
    }

    // === Repositories ===

    /// List repositories the authenticated user can access.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.get(format!("/user/repos?per_page={PER_PAGE}")).await
    }

    /// Get a repository.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.get(repo_path(owner, repo)).await
    }

    /// List branches of a repository.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>> {
        self.get(format!(
            "{}/branches?per_page={PER_PAGE}",
            repo_path(owner, repo)
        ))
        .await
    }

    // === Actions ===

    /// List workflows of a repository.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>> {
        let page: ApiWorkflows = self
            .get(format!(
                "{}/actions/workflows?per_page={PER_PAGE}",
                repo_path(owner, repo)
            ))
            .await?;
        Ok(page.workflows)
    }

    /// List recent workflow runs of a repository.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn list_workflow_runs(&self, owner: &str, repo: &str) -> Result<Vec<WorkflowRun>> {
        let page: ApiWorkflowRuns = self
            .get(format!(
                "{}/actions/runs?per_page={PER_PAGE}",
                repo_path(owner, repo)
            ))
            .await?;
        Ok(page.workflow_runs)
    }

    /// Trigger a `workflow_dispatch` event.
    ///
    /// `workflow` is a workflow ID or file name (e.g. `ci.yml`).
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn trigger_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        trigger: &TriggerWorkflow,
    ) -> Result<()> {
        let descriptor = RequestDescriptor::post(format!(
            "{}/actions/workflows/{}/dispatches",
            repo_path(owner, repo),
            encode_segment(workflow)
        ))
        .json(trigger)?;
        self.send(descriptor).await.map(drop)
    }

    /// Cancel a workflow run.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn cancel_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<()> {
        self.post_empty(format!(
            "{}/actions/runs/{run_id}/cancel",
            repo_path(owner, repo)
        ))
        .await
    }

    /// Re-run a workflow run.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn rerun_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<()> {
        self.post_empty(format!(
            "{}/actions/runs/{run_id}/rerun",
            repo_path(owner, repo)
        ))
        .await
    }

    /// Download the log archive of a workflow run.
    ///
    /// Returns the raw bytes (a zip archive); redirects are followed.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_workflow_run_logs(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<Vec<u8>> {
        let response = self
            .send(RequestDescriptor::get(format!(
                "{}/actions/runs/{run_id}/logs",
                repo_path(owner, repo)
            )))
            .await?;
        Ok(response.into_bytes())
    }

    // === Webhooks ===

    /// Create a repository webhook delivering JSON payloads.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        hook: &CreateWebhook,
    ) -> Result<Webhook> {
        let body = ApiCreateWebhook {
            name: "web",
            active: true,
            events: &hook.events,
            config: ApiWebhookConfig {
                url: &hook.url,
                content_type: "json",
                secret: hook.secret.expose_secret(),
                insecure_ssl: "0",
            },
        };
        let descriptor =
            RequestDescriptor::post(format!("{}/hooks", repo_path(owner, repo))).json(&body)?;
        self.send(descriptor).await?.json()
    }

    /// Delete a repository webhook.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_webhook(&self, owner: &str, repo: &str, hook_id: u64) -> Result<()> {
        self.send(RequestDescriptor::delete(format!(
            "{}/hooks/{hook_id}",
            repo_path(owner, repo)
        )))
        .await
        .map(drop)
    }

    // === Rate limit ===

    /// Fetch the rate limit status of every resource class.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_rate_limit(&self) -> Result<RateLimitOverview> {
        self.get("/rate_limit").await
    }
}

impl GitHubApi for GitHubClient {
    async fn get_authenticated_user(&self) -> Result<User> {
        self.get_authenticated_user().await
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.list_organizations().await
    }

    async fn get_organization(&self, org: &str) -> Result<Organization> {
        self.get_organization(org).await
    }

    async fn list_organization_members(&self, org: &str) -> Result<Vec<User>> {
        self.list_organization_members(org).await
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.list_repositories().await
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.get_repository(owner, repo).await
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>> {
        self.list_branches(owner, repo).await
    }

    async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>> {
        self.list_workflows(owner, repo).await
    }

    async fn list_workflow_runs(&self, owner: &str, repo: &str) -> Result<Vec<WorkflowRun>> {
        self.list_workflow_runs(owner, repo).await
    }

    async fn trigger_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        trigger: &TriggerWorkflow,
    ) -> Result<()> {
        self.trigger_workflow(owner, repo, workflow, trigger).await
    }

    async fn cancel_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<()> {
        self.cancel_workflow_run(owner, repo, run_id).await
    }

    async fn rerun_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<()> {
        self.rerun_workflow_run(owner, repo, run_id).await
    }

    async fn get_workflow_run_logs(&self, owner: &str, repo: &str, run_id: u64) -> Result<Vec<u8>> {
        self.get_workflow_run_logs(owner, repo, run_id).await
    }

    async fn create_webhook(&self, owner: &str, repo: &str, hook: &CreateWebhook) -> Result<Webhook> {
        self.create_webhook(owner, repo, hook).await
    }

    async fn delete_webhook(&self, owner: &str, repo: &str, hook_id: u64) -> Result<()> {
        self.delete_webhook(owner, repo, hook_id).await
    }

    async fn get_rate_limit(&self) -> Result<RateLimitOverview> {
        self.get_rate_limit().await
    }
}
