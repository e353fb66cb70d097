//! `octoqueue hooks` commands - Create and delete repository webhooks.

use anyhow::Result;
use octoqueue_github::CreateWebhook;

use crate::commands::utils::{self, RepoSlug, WEBHOOK_SECRET_ENV};
use crate::config::Config;
use crate::output;

/// Run the hooks create command.
pub fn run_create(
    config: &Config,
    json: bool,
    slug: &RepoSlug,
    url: &str,
    events: &[String],
) -> Result<()> {
    let secret = utils::secret_from_env_or_prompt(WEBHOOK_SECRET_ENV, "Webhook secret:")?;
    let hook = CreateWebhook {
        url: url.to_string(),
        secret,
        events: events.to_vec(),
    };

    let created = utils::with_client(config, !json, |client| async move {
        Ok(client.create_webhook(&slug.owner, &slug.name, &hook).await?)
    })?;

    if json {
        return output::json(&created);
    }
    output::success(&format!("Created webhook {} on {slug}", created.id));
    output::detail(&format!("  Events: {}", created.events.join(", ")));
    Ok(())
}

/// Run the hooks delete command.
pub fn run_delete(config: &Config, json: bool, slug: &RepoSlug, hook_id: u64) -> Result<()> {
    utils::with_client(config, !json, |client| async move {
        Ok(client.delete_webhook(&slug.owner, &slug.name, hook_id).await?)
    })?;

    if json {
        return output::json(&serde_json::json!({ "deleted": hook_id }));
    }
    output::success(&format!("Deleted webhook {hook_id} from {slug}"));
    Ok(())
}
