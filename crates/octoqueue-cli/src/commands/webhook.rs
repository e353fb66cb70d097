//! `octoqueue webhook` commands - Sign and verify payloads offline.

use std::path::Path;

use anyhow::Result;
use octoqueue_github::webhook::{self, WebhookVerifier};
use octoqueue_github::{Error, ExposeSecret};

use crate::commands::utils::{self, WEBHOOK_SECRET_ENV};
use crate::output;

/// Run the webhook sign command.
pub fn run_sign(json: bool, file: Option<&Path>) -> Result<()> {
    let payload = utils::read_payload(file)?;
    let secret = utils::secret_from_env_or_prompt(WEBHOOK_SECRET_ENV, "Webhook secret:")?;

    let signature = webhook::sign(&payload, secret.expose_secret().as_bytes());

    if json {
        return output::json(&serde_json::json!({
            "header": webhook::SIGNATURE_HEADER,
            "signature": signature,
        }));
    }
    output::essential(&signature);
    Ok(())
}

/// Run the webhook verify command.
pub fn run_verify(json: bool, signature: &str, file: Option<&Path>) -> Result<()> {
    let payload = utils::read_payload(file)?;
    let secret = utils::secret_from_env_or_prompt(WEBHOOK_SECRET_ENV, "Webhook secret:")?;
    let verifier = WebhookVerifier::new(secret);

    match verifier.verify_and_parse(&payload, signature) {
        Ok(delivery) => {
            if json {
                return output::json(&serde_json::json!({
                    "valid": true,
                    "action": delivery.action(),
                    "payload": delivery.json(),
                }));
            }
            output::success("Signature is valid");
            if let Some(action) = delivery.action() {
                output::detail(&format!("  Action: {action}"));
            }
            Ok(())
        }
        // The signature matched; the body just isn't JSON.
        Err(Error::Payload(err)) => {
            if json {
                return output::json(&serde_json::json!({ "valid": true, "action": null }));
            }
            output::success("Signature is valid");
            output::warn(&format!("Payload is not JSON: {err}"));
            Ok(())
        }
        Err(err) => {
            if json {
                output::json(&serde_json::json!({ "valid": false }))?;
            }
            Err(err.into())
        }
    }
}
