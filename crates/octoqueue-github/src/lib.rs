//! # octoqueue-github
//!
//! Rate-limit aware GitHub API client.
//!
//! All calls made through a [`GitHubClient`] are queued and dispatched one at
//! a time by a single worker that tracks the API quota. When the quota runs
//! out, queued work waits for the window to reset instead of failing; a
//! request rejected for rate limiting is retried before anything queued
//! after it.
//!
//! The crate also implements GitHub's OAuth authorization-code flow
//! ([`OAuthFlow`]) and webhook signature verification ([`WebhookVerifier`]).
//!
//! # Security
//!
//! Authentication tokens and secrets are stored using `SecretString` which
//! automatically zeroizes memory when dropped and redacts itself in `Debug`
//! output.

mod auth;
mod client;
mod clock;
mod config;
mod error;
pub mod oauth;
mod quota;
mod request;
pub mod scheduler;
mod traits;
pub mod transport;
mod types;
pub mod webhook;

pub use auth::Auth;
pub use client::GitHubClient;
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use oauth::{OAuthConfig, OAuthFlow, TokenResponse};
pub use quota::QuotaState;
pub use request::{ApiResponse, RequestDescriptor};
pub use scheduler::{RequestHandle, RequestId, RequestScheduler, ShutdownMode};
// Re-export SecretString for constructing Auth::Token
pub use secrecy::{ExposeSecret, SecretString};
pub use traits::GitHubApi;
pub use types::{
    Branch, BranchCommit, CreateWebhook, Organization, RateLimitOverview, RateLimitWindow,
    Repository, RepositoryOwner, RunStatus, TriggerWorkflow, User, Webhook, WebhookConfig,
    Workflow, WorkflowRun,
};
pub use webhook::{WebhookPayload, WebhookVerifier};
