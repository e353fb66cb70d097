//! GitHub API types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub user or organization member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: u64,

    /// Login name.
    pub login: String,

    /// Display name (only on full user objects).
    #[serde(default)]
    pub name: Option<String>,

    /// Public email (only on full user objects).
    #[serde(default)]
    pub email: Option<String>,

    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,

    /// Profile URL.
    #[serde(default)]
    pub html_url: Option<String>,
}

/// A GitHub organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization ID.
    pub id: u64,

    /// Login name.
    pub login: String,

    /// Display name (only on full organization objects).
    #[serde(default)]
    pub name: Option<String>,

    /// Description.
    #[serde(default)]
    pub description: Option<String>,

    /// Profile URL (only on full organization objects).
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Owner of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    /// Login name.
    pub login: String,
}

/// A repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository ID.
    pub id: u64,

    /// Short name.
    pub name: String,

    /// `owner/name`.
    pub full_name: String,

    /// Owner.
    pub owner: RepositoryOwner,

    /// Whether the repository is private.
    pub private: bool,

    /// Description.
    #[serde(default)]
    pub description: Option<String>,

    /// Repository URL.
    pub html_url: String,

    /// Default branch name.
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// A branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name.
    pub name: String,

    /// Head commit.
    pub commit: BranchCommit,

    /// Whether branch protection is enabled.
    #[serde(default)]
    pub protected: bool,
}

/// Commit a branch points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCommit {
    /// Commit SHA.
    pub sha: String,
}

/// A GitHub Actions workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow ID.
    pub id: u64,

    /// Workflow name.
    pub name: String,

    /// Path of the workflow file.
    pub path: String,

    /// Workflow state (e.g., "active", "disabled_manually").
    pub state: String,
}

/// A run of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Run ID.
    pub id: u64,

    /// Run name.
    #[serde(default)]
    pub name: Option<String>,

    /// Branch the run was triggered on.
    #[serde(default)]
    pub head_branch: Option<String>,

    /// Commit the run was triggered on.
    pub head_sha: String,

    /// Triggering event (e.g., "push", "workflow_dispatch").
    pub event: String,

    /// Run status.
    #[serde(default)]
    pub status: Option<RunStatus>,

    /// Run conclusion, once completed.
    #[serde(default)]
    pub conclusion: Option<String>,

    /// Workflow the run belongs to.
    pub workflow_id: u64,

    /// Run URL.
    pub html_url: String,

    /// When the run was created.
    pub created_at: DateTime<Utc>,
}

/// Status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is queued.
    Queued,
    /// Run is in progress.
    InProgress,
    /// Run completed.
    Completed,
    /// Run is waiting for approval.
    Waiting,
    /// Run was requested.
    Requested,
    /// Run is pending.
    Pending,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Check if the run has finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Request to trigger a `workflow_dispatch` event.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerWorkflow {
    /// Branch or tag to run the workflow on.
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Workflow inputs.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,
}

/// A repository webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    /// Hook ID.
    pub id: u64,

    /// Whether the hook is active.
    pub active: bool,

    /// Subscribed events.
    pub events: Vec<String>,

    /// Delivery configuration.
    pub config: WebhookConfig,
}

/// Delivery configuration of a webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Delivery URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Payload content type ("json" or "form").
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Request to create a repository webhook.
#[derive(Debug, Clone)]
pub struct CreateWebhook {
    /// Delivery URL.
    pub url: String,

    /// Shared secret GitHub signs deliveries with.
    pub secret: secrecy::SecretString,

    /// Events to subscribe to.
    pub events: Vec<String>,
}

/// Rate limit status for every resource class, from `GET /rate_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitOverview {
    /// Windows keyed by resource class ("core", "search", "graphql", ...).
    pub resources: BTreeMap<String, RateLimitWindow>,
}

/// One rate limit window as reported by `GET /rate_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    /// Maximum requests in the window.
    pub limit: u64,

    /// Requests remaining.
    pub remaining: u64,

    /// Requests made.
    #[serde(default)]
    pub used: u64,

    /// Reset time as Unix seconds.
    pub reset: i64,
}
