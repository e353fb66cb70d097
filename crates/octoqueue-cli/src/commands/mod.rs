//! CLI command definitions and implementations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::config::DEFAULT_CONFIG_FILE;
use utils::RepoSlug;

pub mod actions;
pub mod completions;
pub mod hooks;
pub mod oauth;
pub mod orgs;
pub mod overview;
pub mod quota;
pub mod repos;
pub mod user;
pub mod utils;
pub mod webhook;

/// octoqueue - a rate-limit aware GitHub client.
///
/// Every API call made by one invocation goes through a single queue that
/// waits for the rate limit window to reset instead of failing.
#[derive(Parser)]
#[command(name = "octoqueue", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Show debug logs on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the authenticated user.
    User,

    /// List your organizations, or show one organization.
    Orgs {
        /// Organization login.
        org: Option<String>,

        /// List the organization's members.
        #[arg(long, requires = "org")]
        members: bool,
    },

    /// List your repositories, or show one repository.
    Repos {
        /// Repository as `owner/name`.
        repo: Option<RepoSlug>,
    },

    /// List branches of a repository.
    Branches {
        /// Repository as `owner/name`.
        repo: RepoSlug,
    },

    /// List workflows of a repository.
    Workflows {
        /// Repository as `owner/name`.
        repo: RepoSlug,
    },

    /// List recent workflow runs of a repository.
    Runs {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Maximum number of runs to show.
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Trigger a workflow_dispatch event.
    Trigger {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Workflow ID or file name (e.g. `deploy.yml`).
        workflow: String,

        /// Branch or tag to run on.
        #[arg(long = "ref", default_value = "main")]
        git_ref: String,

        /// Workflow input as `key=value` (repeatable).
        #[arg(short, long = "input", value_parser = utils::parse_input)]
        inputs: Vec<(String, String)>,
    },

    /// Cancel a workflow run.
    Cancel {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Run ID.
        run_id: u64,
    },

    /// Re-run a workflow run.
    Rerun {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Run ID.
        run_id: u64,
    },

    /// Download the log archive of a workflow run.
    Logs {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Run ID.
        run_id: u64,

        /// File to write the zip archive to.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Manage repository webhooks.
    #[command(subcommand)]
    Hooks(HookCommands),

    /// Summarize a repository: branches, workflows and their latest runs.
    Overview {
        /// Repository as `owner/name`.
        repo: RepoSlug,
    },

    /// Show rate limit status.
    Quota,

    /// Run the OAuth authorization-code flow.
    #[command(subcommand)]
    Oauth(OAuthCommands),

    /// Sign or verify webhook payloads (offline).
    #[command(subcommand)]
    Webhook(WebhookCommands),

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum HookCommands {
    /// Create a webhook. The secret is read from `GITHUB_WEBHOOK_SECRET` or prompted.
    Create {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Delivery URL.
        url: String,

        /// Event to subscribe to (repeatable).
        #[arg(short, long = "event", default_values_t = [String::from("push")])]
        events: Vec<String>,
    },

    /// Delete a webhook.
    Delete {
        /// Repository as `owner/name`.
        repo: RepoSlug,

        /// Hook ID.
        hook_id: u64,
    },
}

#[derive(Subcommand)]
pub enum OAuthCommands {
    /// Print the authorization URL to open in a browser.
    Url {
        /// Anti-CSRF state (random if omitted).
        #[arg(long)]
        state: Option<String>,
    },

    /// Exchange an authorization code for a token.
    ///
    /// The client secret is read from `GITHUB_CLIENT_SECRET` or prompted.
    Exchange {
        /// Code from the callback (prompted if omitted).
        code: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum WebhookCommands {
    /// Print the `sha256=` signature for a payload.
    Sign {
        /// Payload file (stdin if omitted).
        file: Option<PathBuf>,
    },

    /// Verify a payload against its `X-Hub-Signature-256` value.
    Verify {
        /// Signature header value (`sha256=<hex>`).
        #[arg(short, long)]
        signature: String,

        /// Payload file (stdin if omitted).
        file: Option<PathBuf>,
    },
}
