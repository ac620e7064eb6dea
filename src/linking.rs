//! Link token lifecycle: issue, then consume at most once

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{LinkOutcome, LinkToken};
use crate::store::Store;

/// Generate an opaque, unguessable token (122 random bits)
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Issue a token for `owner_id`, valid for `ttl` from `now`
pub async fn issue_link_token(
    store: &dyn Store,
    owner_id: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<LinkToken> {
    let token = LinkToken::issue(generate_token(), owner_id.to_string(), now, ttl);
    store.insert_link_token(&token).await?;

    tracing::info!("Issued link token expiring at {}", token.expires_at.to_rfc3339());

    Ok(token)
}

/// Consume `token` on behalf of `phone`
///
/// Domain outcomes (unknown, expired, used) are values, not errors.
pub async fn consume_link_token(
    store: &dyn Store,
    token: &str,
    phone: &str,
    now: DateTime<Utc>,
) -> Result<LinkOutcome> {
    let outcome = store.consume_link_token(token, phone, now).await?;

    match &outcome {
        LinkOutcome::Linked { .. } => tracing::info!("Linked WhatsApp number {}", phone),
        other => tracing::info!("Link attempt from {} rejected: {:?}", phone, other),
    }

    Ok(outcome)
}
