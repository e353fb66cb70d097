//! octoqueue CLI - a rate-limit aware GitHub client.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;
mod services;

use commands::{Cli, Commands, HookCommands, OAuthCommands, WebhookCommands};
use config::Config;

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("{e:#}"));
            std::process::exit(1);
        }
    };
    init_tracing(&config, cli.verbose);
    debug!(
        path = %cli.config.display(),
        api_url = %config.api.api_url,
        "configuration loaded"
    );

    if let Err(e) = run(cli, &config) {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose` and the config file.
fn init_tracing(config: &Config, verbose: bool) {
    let default_filter = if verbose {
        "debug"
    } else {
        config.log.level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::User => commands::user::run(config, json),
        Commands::Orgs { org, members } => {
            commands::orgs::run(config, json, org.as_deref(), members)
        }
        Commands::Repos { repo } => commands::repos::run(config, json, repo.as_ref()),
        Commands::Branches { repo } => commands::repos::run_branches(config, json, &repo),
        Commands::Workflows { repo } => commands::actions::run_workflows(config, json, &repo),
        Commands::Runs { repo, limit } => commands::actions::run_runs(config, json, &repo, limit),
        Commands::Trigger {
            repo,
            workflow,
            git_ref,
            inputs,
        } => commands::actions::run_trigger(config, json, &repo, &workflow, &git_ref, &inputs),
        Commands::Cancel { repo, run_id } => {
            commands::actions::run_cancel(config, json, &repo, run_id)
        }
        Commands::Rerun { repo, run_id } => {
            commands::actions::run_rerun(config, json, &repo, run_id)
        }
        Commands::Logs {
            repo,
            run_id,
            output,
        } => commands::actions::run_logs(config, json, &repo, run_id, &output),
        Commands::Hooks(HookCommands::Create { repo, url, events }) => {
            commands::hooks::run_create(config, json, &repo, &url, &events)
        }
        Commands::Hooks(HookCommands::Delete { repo, hook_id }) => {
            commands::hooks::run_delete(config, json, &repo, hook_id)
        }
        Commands::Overview { repo } => commands::overview::run(config, json, &repo),
        Commands::Quota => commands::quota::run(config, json),
        Commands::Oauth(OAuthCommands::Url { state }) => {
            commands::oauth::run_url(config, json, state)
        }
        Commands::Oauth(OAuthCommands::Exchange { code }) => {
            commands::oauth::run_exchange(config, json, code)
        }
        Commands::Webhook(WebhookCommands::Sign { file }) => {
            commands::webhook::run_sign(json, file.as_deref())
        }
        Commands::Webhook(WebhookCommands::Verify { signature, file }) => {
            commands::webhook::run_verify(json, &signature, file.as_deref())
        }
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}
