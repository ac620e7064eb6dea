use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Webhook Signatures
// =============================================================================

/// Build the string the provider signs
///
/// `url || key1 value1 [value1' ...] || key2 value2 ...` with keys in
/// lexicographic order. Repeated keys contribute every value, in the order
/// they appeared in the body.
pub fn signature_payload(url: &str, params: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in params {
        grouped.entry(key.as_str()).or_default().push(value.as_str());
    }

    let mut payload = String::from(url);
    for (key, values) in grouped {
        for value in values {
            payload.push_str(key);
            payload.push_str(value);
        }
    }
    payload
}

fn keyed_mac(url: &str, params: &[(String, String)], secret: &str) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(signature_payload(url, params).as_bytes());
    Some(mac)
}

/// Compute the hex-encoded HMAC-SHA256 signature of a webhook request
pub fn compute_signature(url: &str, params: &[(String, String)], secret: &str) -> String {
    keyed_mac(url, params, secret)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Verify a webhook signature against the shared secret
///
/// The comparison is constant-time. An empty secret never verifies: an
/// unconfigured deployment rejects every webhook instead of trusting it.
///
/// # Arguments
/// * `url` - The full URL the provider posted to
/// * `params` - Form-encoded body parameters, in body order
/// * `signature` - The hex-encoded signature header
/// * `secret` - The shared secret (provider auth token)
pub fn verify_webhook_signature(
    url: &str,
    params: &[(String, String)],
    signature: &str,
    secret: &str,
) -> bool {
    if secret.is_empty() {
        tracing::error!("Webhook secret not configured, rejecting request");
        return false;
    }

    let Some(mac) = keyed_mac(url, params, secret) else {
        return false;
    };

    let sig_bytes = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}
