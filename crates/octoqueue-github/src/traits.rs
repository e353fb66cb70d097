//! Trait abstractions for GitHub API operations.
//!
//! This module defines the `GitHubApi` trait which abstracts the typed
//! operations, so consumers can be written against a mock in tests.

use std::future::Future;

use crate::{
    Branch, CreateWebhook, Organization, RateLimitOverview, Repository, Result, TriggerWorkflow,
    User, Webhook, Workflow, WorkflowRun,
};

/// Trait for GitHub API operations.
///
/// Repository-scoped methods take `owner` and `repo` as parameters to support
/// operations across different repositories.
pub trait GitHubApi: Send + Sync {
    // === User & Organizations ===

    /// Get the user the token belongs to.
    fn get_authenticated_user(&self) -> impl Future<Output = Result<User>> + Send;

    /// List organizations of the authenticated user.
    fn list_organizations(&self) -> impl Future<Output = Result<Vec<Organization>>> + Send;

    /// Get an organization.
    fn get_organization(&self, org: &str) -> impl Future<Output = Result<Organization>> + Send;

    /// List members of an organization.
    fn list_organization_members(
        &self,
        org: &str,
    ) -> impl Future<Output = Result<Vec<User>>> + Send;

    // === Repositories ===

    /// List repositories the authenticated user can access.
    fn list_repositories(&self) -> impl Future<Output = Result<Vec<Repository>>> + Send;

    /// Get a repository.
    fn get_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Repository>> + Send;

    /// List branches of a repository.
    fn list_branches(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Vec<Branch>>> + Send;

    // === Actions ===

    /// List workflows of a repository.
    fn list_workflows(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Vec<Workflow>>> + Send;

    /// List recent workflow runs of a repository, newest first.
    fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Vec<WorkflowRun>>> + Send;

    /// Trigger a `workflow_dispatch` event.
    fn trigger_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        trigger: &TriggerWorkflow,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Cancel a workflow run.
    fn cancel_workflow_run(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Re-run a workflow run.
    fn rerun_workflow_run(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Download the log archive of a workflow run.
    fn get_workflow_run_logs(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    // === Webhooks ===

    /// Create a repository webhook.
    fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        hook: &CreateWebhook,
    ) -> impl Future<Output = Result<Webhook>> + Send;

    /// Delete a repository webhook.
    fn delete_webhook(
        &self,
        owner: &str,
        repo: &str,
        hook_id: u64,
    ) -> impl Future<Output = Result<()>> + Send;

    // === Rate limit ===

    /// Fetch the rate limit status of every resource class.
    fn get_rate_limit(&self) -> impl Future<Output = Result<RateLimitOverview>> + Send;
}
