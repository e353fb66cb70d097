//! Webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body and
//! sends the result as `X-Hub-Signature-256: sha256=<hex>`. Verification
//! must run on the exact bytes received, before any parsing.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header GitHub puts the signature in.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

fn mac(raw: &[u8], secret: &[u8]) -> HmacSha256 {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
    };
    mac.update(raw);
    mac
}

/// Check `signature` (`sha256=<hex>`) against `raw` signed with `secret`.
///
/// Returns `false` for a wrong prefix, bad hex, wrong length or wrong
/// digest; never panics. The digest comparison is constant-time.
#[must_use]
pub fn verify(raw: &[u8], signature: &str, secret: &[u8]) -> bool {
    let Some(hex_digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(provided) = hex::decode(hex_digest) else {
        return false;
    };

    let expected = mac(raw, secret).finalize().into_bytes();
    if provided.len() != expected.len() {
        return false;
    }
    provided.ct_eq(&expected).into()
}

/// Compute the `sha256=<hex>` signature GitHub would send for `raw`.
#[must_use]
pub fn sign(raw: &[u8], secret: &[u8]) -> String {
    let digest = mac(raw, secret).finalize().into_bytes();
    format!("{SIGNATURE_PREFIX}{}", hex::encode(digest))
}

/// Parse a delivery body.
///
/// # Errors
/// Returns [`Error::Payload`] if `raw` is not JSON.
pub fn parse_payload(raw: &[u8]) -> Result<WebhookPayload> {
    let json = serde_json::from_slice(raw).map_err(Error::Payload)?;
    Ok(WebhookPayload {
        raw: raw.to_vec(),
        json,
        signature: None,
    })
}

/// A webhook delivery: the raw body and its parsed JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookPayload {
    raw: Vec<u8>,
    json: serde_json::Value,
    signature: Option<String>,
}

impl WebhookPayload {
    /// Body exactly as received.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Parsed body.
    #[must_use]
    pub const fn json(&self) -> &serde_json::Value {
        &self.json
    }

    /// Signature the payload was verified against, if any.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// The `action` field (e.g. `opened`), present on most event types.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.json.get("action").and_then(serde_json::Value::as_str)
    }

    /// Deserialize the body into an event type.
    ///
    /// # Errors
    /// Returns [`Error::Payload`] if the body does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.raw).map_err(Error::Payload)
    }
}

/// Verifies deliveries for one webhook secret.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    /// Create a verifier for `secret`.
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Check `signature` against `raw`.
    #[must_use]
    pub fn verify(&self, raw: &[u8], signature: &str) -> bool {
        verify(raw, signature, self.secret.expose_secret().as_bytes())
    }

    /// Verify then parse a delivery.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSignature`] without parsing if the signature
    /// does not match, and [`Error::Payload`] if the body is not JSON.
    pub fn verify_and_parse(&self, raw: &[u8], signature: &str) -> Result<WebhookPayload> {
        if !self.verify(raw, signature) {
            return Err(Error::InvalidSignature);
        }
        let mut payload = parse_payload(raw)?;
        payload.signature = Some(signature.to_string());
        Ok(payload)
    }
}
