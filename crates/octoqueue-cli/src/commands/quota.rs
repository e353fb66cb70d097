//! `octoqueue quota` command - Show rate limit status.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use octoqueue_github::{QuotaState, RateLimitOverview};
use serde::Serialize;

use crate::commands::utils;
use crate::config::Config;
use crate::output;

/// JSON output for quota command.
#[derive(Debug, Serialize)]
struct QuotaOutput {
    /// Window the client tracked from response headers.
    tracked: QuotaState,
    /// Every resource class as reported by `/rate_limit`.
    resources: RateLimitOverview,
}

/// Run the quota command.
pub fn run(config: &Config, json: bool) -> Result<()> {
    let (resources, tracked) = utils::with_client(config, !json, |client| async move {
        let resources = client.get_rate_limit().await?;
        Ok((resources, client.quota()))
    })?;

    if json {
        return output::json(&QuotaOutput { tracked, resources });
    }

    let now = Utc::now();
    output::info(&output::quota_line(&tracked, now));
    output::hr();
    for (resource, window) in &resources.resources {
        let reset = DateTime::<Utc>::from_timestamp(window.reset, 0)
            .map_or_else(|| "-".to_string(), |at| at.format("%H:%M:%S UTC").to_string());
        let remaining = if window.remaining == 0 {
            window.remaining.to_string().red().to_string()
        } else {
            window.remaining.to_string()
        };
        output::essential(&format!(
            "{resource:<28} {remaining:>6}/{:<6} resets {}",
            window.limit,
            reset.dimmed()
        ));
    }
    Ok(())
}
